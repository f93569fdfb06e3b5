//! `blueprint edit`: apply a plan file to an event schema and commit it.

use super::error::HelpfulError;
use super::output::{print_schema, print_session_preview};
use super::plan::EditPlan;
use super::show::fetch;
use anyhow::Result;
use blueprint_schema::{CommitError, CommitRequest, Schema, SchemaEditor, SchemaService};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EditArgs {
    pub event: String,
    pub plan: PathBuf,
    /// Validate and print the request without sending it
    pub dry_run: bool,
    /// Re-fetch the schema after committing and compare
    pub verify: bool,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Validated request that was not sent
    DryRun(CommitRequest),
    Committed {
        schema: Schema,
        /// `Some(false)` when the service's schema differs from the local result
        verified: Option<bool>,
    },
}

/// Load, stage, validate, and optionally commit.
pub async fn execute<S>(args: &EditArgs, service: &S, base_url: &str) -> Result<EditOutcome>
where
    S: SchemaService + ?Sized,
{
    if !args.plan.exists() {
        return Err(HelpfulError::plan_not_found(&args.plan).into());
    }
    let plan = EditPlan::load(&args.plan)?;

    let baseline = fetch(service, base_url, &args.event).await?;
    let mut editor = SchemaEditor::new(baseline);
    plan.apply(&mut editor)?;

    if args.dry_run {
        let approval = editor
            .validate()
            .map_err(|r| HelpfulError::commit_error(&args.event, &CommitError::Rejected(r)))?;
        if !args.json {
            print_session_preview(editor.schema(), editor.session());
        }
        let request = CommitRequest::new(editor.session().additions().to_vec(), approval);
        return Ok(EditOutcome::DryRun(request));
    }

    editor
        .commit(service)
        .await
        .map_err(|e| HelpfulError::commit_error(&args.event, &e))?;
    info!(event = %args.event, "schema committed");

    let verified = if args.verify {
        let remote = fetch(service, base_url, &args.event).await?;
        let matches = &remote == editor.schema();
        if !matches {
            warn!(
                event = %args.event,
                "service schema differs from the locally reconciled result; using the service copy"
            );
            editor.reload(remote);
        }
        Some(matches)
    } else {
        None
    };

    Ok(EditOutcome::Committed {
        schema: editor.schema().clone(),
        verified,
    })
}

pub async fn run<S>(args: EditArgs, service: &S, base_url: &str) -> Result<()>
where
    S: SchemaService + ?Sized,
{
    match execute(&args, service, base_url).await? {
        EditOutcome::DryRun(request) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&request)?);
            } else {
                println!();
                println!("Dry run: nothing was sent. Request body:");
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
        }
        EditOutcome::Committed { schema, verified } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&schema)?);
            } else {
                print_schema(&schema);
                match verified {
                    Some(true) => println!("Verified against the service."),
                    Some(false) => println!("WARNING: the service reports a different schema (shown above)."),
                    None => {}
                }
            }
        }
    }
    Ok(())
}
