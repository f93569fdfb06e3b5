//! End-to-End tests for `blueprint edit`
//!
//! Plan file on disk -> baseline from an in-memory service -> staged edits ->
//! validation -> commit, without any network access.

use async_trait::async_trait;
use blueprint::cli::edit::{execute, EditArgs, EditOutcome};
use blueprint_schema::{reconcile, Column, CommitRequest, EditSession, Schema, SchemaService, ServiceError};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

const BASE_URL: &str = "http://schema.test";

/// Applies accepted requests to its stored schema, like the real service.
struct InMemoryService {
    schema: Mutex<Schema>,
    requests: Mutex<Vec<CommitRequest>>,
    /// Rename applied server-side after every commit, to simulate drift
    drift: Option<(String, String)>,
}

impl InMemoryService {
    fn new(schema: Schema) -> Self {
        Self {
            schema: Mutex::new(schema),
            requests: Mutex::new(Vec::new()),
            drift: None,
        }
    }

    fn with_drift(mut self, from: &str, to: &str) -> Self {
        self.drift = Some((from.to_string(), to.to_string()));
        self
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SchemaService for InMemoryService {
    async fn fetch_schema(&self, event_name: &str) -> Result<Schema, ServiceError> {
        let schema = self.schema.lock().unwrap();
        if schema.event_name == event_name {
            Ok(schema.clone())
        } else {
            Err(ServiceError::NotFound(event_name.to_string()))
        }
    }

    async fn fetch_types(&self) -> Result<Vec<String>, ServiceError> {
        Ok(Vec::new())
    }

    async fn update_schema(&self, _event_name: &str, request: &CommitRequest) -> Result<(), ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut schema = self.schema.lock().unwrap();

        let names: Vec<String> = schema.outbound_names().map(str::to_string).collect();
        let mut session = EditSession::new(&schema);
        for (i, name) in names.iter().enumerate() {
            if request.deletes.contains(name) {
                session.stage_deletion(i).map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
            }
        }
        for column in &request.additions {
            session.stage_addition(column.clone());
        }
        reconcile(&mut schema, &mut session, &request.renames);

        if let Some((from, to)) = &self.drift {
            if let Some(column) = schema.columns.iter_mut().find(|c| &c.outbound_name == from) {
                column.outbound_name = to.clone();
            }
        }
        Ok(())
    }
}

fn login_schema() -> Schema {
    Schema::new(
        "login",
        vec![
            Column::new("time", "time", "f@timestamp@unix").with_options(" sortkey"),
            Column::new("ip", "ip", "varchar").with_size(15),
            Column::new("login", "login", "varchar").with_size(64),
            Column::new("legacy", "legacy", "bool"),
        ],
    )
}

fn write_plan(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("plan.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn args(plan: PathBuf) -> EditArgs {
    EditArgs {
        event: "login".to_string(),
        plan,
        dry_run: false,
        verify: false,
        json: true,
    }
}

const PLAN: &str = r#"
[[add]]
inbound = "ip"
outbound = "city"
transformer = "ipCity"

[[delete]]
column = "legacy"

[[rename]]
from = "login"
to = "username"
"#;

// =============================================================================
// COMMIT
// =============================================================================

#[tokio::test]
async fn test_edit_commits_plan() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());

    let outcome = execute(&args(write_plan(&dir, PLAN)), &service, BASE_URL)
        .await
        .unwrap();

    let schema = match outcome {
        EditOutcome::Committed { schema, verified } => {
            assert_eq!(verified, None);
            schema
        }
        other => panic!("expected commit, got {:?}", other),
    };
    let names: Vec<&str> = schema.outbound_names().collect();
    assert_eq!(names, vec!["time", "ip", "username", "city"]);
    assert_eq!(service.request_count(), 1);
}

#[tokio::test]
async fn test_edit_verify_matches_service() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());
    let mut edit = args(write_plan(&dir, PLAN));
    edit.verify = true;

    let outcome = execute(&edit, &service, BASE_URL).await.unwrap();
    assert!(matches!(outcome, EditOutcome::Committed { verified: Some(true), .. }));
}

#[tokio::test]
async fn test_edit_verify_adopts_service_copy_on_drift() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema()).with_drift("city", "geo_city");
    let mut edit = args(write_plan(&dir, PLAN));
    edit.verify = true;

    match execute(&edit, &service, BASE_URL).await.unwrap() {
        EditOutcome::Committed { schema, verified } => {
            assert_eq!(verified, Some(false));
            assert_eq!(schema.columns[3].outbound_name, "geo_city");
        }
        other => panic!("expected commit, got {:?}", other),
    }
}

// =============================================================================
// DRY RUN AND REFUSALS
// =============================================================================

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());
    let mut edit = args(write_plan(&dir, PLAN));
    edit.dry_run = true;

    let outcome = execute(&edit, &service, BASE_URL).await.unwrap();
    match outcome {
        EditOutcome::DryRun(request) => {
            assert_eq!(request.deletes, vec!["legacy".to_string()]);
            assert_eq!(request.renames.get("login").map(String::as_str), Some("username"));
            assert_eq!(request.additions[0].outbound_name, "city");
        }
        other => panic!("expected dry run, got {:?}", other),
    }
    assert_eq!(service.request_count(), 0);
    assert_eq!(service.fetch_schema("login").await.unwrap(), login_schema());
}

#[tokio::test]
async fn test_rejected_plan_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());
    let plan = write_plan(
        &dir,
        "[[rename]]\nfrom = \"ip\"\nto = \"shared\"\n\n[[rename]]\nfrom = \"login\"\nto = \"shared\"\n",
    );

    let err = execute(&args(plan), &service, BASE_URL).await.unwrap_err();
    assert!(err.to_string().contains("Duplicate name. Offending name: shared"));
    assert_eq!(service.request_count(), 0);
}

#[tokio::test]
async fn test_reserved_name_rejected() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());
    let plan = write_plan(&dir, "[[add]]\ninbound = \"day\"\noutbound = \"date\"\n");

    let err = execute(&args(plan), &service, BASE_URL).await.unwrap_err();
    assert!(err.to_string().contains("reserved identifier"));
    assert_eq!(service.request_count(), 0);
}

#[tokio::test]
async fn test_missing_plan_file() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());

    let err = execute(&args(dir.path().join("absent.toml")), &service, BASE_URL)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Plan file not found"));
}

#[tokio::test]
async fn test_unknown_event() {
    let dir = TempDir::new().unwrap();
    let service = InMemoryService::new(login_schema());
    let mut edit = args(write_plan(&dir, PLAN));
    edit.event = "signup".to_string();

    let err = execute(&edit, &service, BASE_URL).await.unwrap_err();
    assert!(err.to_string().contains("Schema not found: signup"));
}
