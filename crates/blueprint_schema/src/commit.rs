//! Commit and reconciliation
//!
//! A [`SchemaEditor`] owns one baseline [`Schema`] together with its
//! [`EditSession`] and drives the commit state machine:
//!
//! ```text
//! Idle -> Validating -> Submitting -> Reconciled -> Idle
//!              |              \-----> Failed -----> Idle
//!              \-- rejected --------------------> Idle
//! ```
//!
//! Exactly one request is in flight per editor. While `Submitting`, every
//! mutating operation fails with [`SessionError::CommitInFlight`].
//!
//! On success the accepted request is folded into the baseline locally; the
//! editor does not re-fetch. Callers that need server truth call
//! [`SchemaEditor::reload`] with a freshly loaded schema.

use crate::column::{Column, ColumnDraft};
use crate::policy::is_column_deletable;
use crate::schema::Schema;
use crate::service::{SchemaService, ServiceError};
use crate::session::{EditSession, SessionError};
use crate::validation::{validate_commit, Approval, Rejection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by a commit attempt.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Commit failed: {0}")]
    Remote(#[from] ServiceError),

    #[error("No commit is in flight for event '{0}'")]
    NotSubmitting(String),
}

/// Body of the update request sent to the persistence service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub additions: Vec<Column>,
    pub deletes: Vec<String>,
    pub renames: BTreeMap<String, String>,
}

impl CommitRequest {
    pub fn new(additions: Vec<Column>, approval: Approval) -> Self {
        Self {
            additions,
            deletes: approval.deletes,
            renames: approval.renames,
        }
    }
}

/// Where an editor is in the commit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Idle,
    Validating,
    Submitting,
    Reconciled,
    Failed,
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitState::Idle => write!(f, "idle"),
            CommitState::Validating => write!(f, "validating"),
            CommitState::Submitting => write!(f, "submitting"),
            CommitState::Reconciled => write!(f, "reconciled"),
            CommitState::Failed => write!(f, "failed"),
        }
    }
}

/// A validated request waiting for the service's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub event_name: String,
    pub request: CommitRequest,
}

/// Remove the elements at `indices`, all of which refer to the original order.
///
/// Indices are applied highest first so earlier removals never shift later
/// ones. Duplicates and out-of-range indices are ignored.
pub fn remove_indices<T>(items: &mut Vec<T>, indices: impl IntoIterator<Item = usize>) {
    let ordered: BTreeSet<usize> = indices.into_iter().collect();
    for index in ordered.into_iter().rev() {
        if index < items.len() {
            items.remove(index);
        }
    }
}

/// Fold an accepted commit into the baseline and reset the session.
pub fn reconcile(schema: &mut Schema, session: &mut EditSession, renames: &BTreeMap<String, String>) {
    remove_indices(&mut schema.columns, session.deletes.iter().copied());
    schema.columns.append(&mut session.additions);
    for column in &mut schema.columns {
        if let Some(new_name) = renames.get(&column.outbound_name) {
            column.outbound_name = new_name.clone();
        }
    }
    *session = EditSession::new(schema);
}

/// Baseline schema plus its edit session and commit state.
#[derive(Debug, Clone)]
pub struct SchemaEditor {
    schema: Schema,
    session: EditSession,
    state: CommitState,
}

impl SchemaEditor {
    pub fn new(schema: Schema) -> Self {
        let session = EditSession::new(&schema);
        Self {
            schema,
            session,
            state: CommitState::Idle,
        }
    }

    /// Replace the baseline and start a clean session.
    ///
    /// This is also the way out of an abandoned `Submitting` state.
    pub fn reload(&mut self, schema: Schema) {
        if self.state == CommitState::Submitting {
            warn!(
                event = %self.schema.event_name,
                "reloading while a commit was in flight; its outcome is unknown"
            );
        }
        self.session = EditSession::new(&schema);
        self.schema = schema;
        self.state = CommitState::Idle;
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn state(&self) -> CommitState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == CommitState::Submitting
    }

    fn transition(&mut self, next: CommitState) {
        debug!(event = %self.schema.event_name, from = %self.state, to = %next, "commit state");
        self.state = next;
    }

    fn session_mut(&mut self) -> Result<&mut EditSession, SessionError> {
        if self.is_busy() {
            return Err(SessionError::CommitInFlight);
        }
        Ok(&mut self.session)
    }

    pub fn draft_mut(&mut self) -> Result<&mut ColumnDraft, SessionError> {
        Ok(self.session_mut()?.draft_mut())
    }

    pub fn clear_draft(&mut self) -> Result<(), SessionError> {
        self.session_mut()?.clear_draft();
        Ok(())
    }

    pub fn stage_addition(&mut self, column: Column) -> Result<(), SessionError> {
        self.session_mut()?.stage_addition(column);
        Ok(())
    }

    pub fn stage_draft(&mut self) -> Result<(), SessionError> {
        self.session_mut()?.stage_draft()?;
        Ok(())
    }

    pub fn remove_staged_addition(&mut self, index: usize) -> Result<Column, SessionError> {
        self.session_mut()?.remove_staged_addition(index)
    }

    /// Stage a deletion, refusing sort and distribution keys.
    pub fn stage_deletion(&mut self, baseline_index: usize) -> Result<(), SessionError> {
        self.session_mut()?;
        match self.schema.column(baseline_index) {
            Some(column) if !is_column_deletable(&self.schema, baseline_index) => {
                Err(SessionError::NotDeletable(column.outbound_name.clone()))
            }
            _ => self.session.stage_deletion(baseline_index),
        }
    }

    pub fn unstage_deletion(&mut self, baseline_index: usize) -> Result<bool, SessionError> {
        Ok(self.session_mut()?.unstage_deletion(baseline_index))
    }

    pub fn rename_column(&mut self, original: &str, new_name: impl Into<String>) -> Result<(), SessionError> {
        self.session_mut()?.rename_column(original, new_name)
    }

    pub fn undo_rename(&mut self, original: &str) -> Result<(), SessionError> {
        self.session_mut()?.undo_rename(original)
    }

    /// Run commit validation without changing any state.
    pub fn validate(&self) -> Result<Approval, Rejection> {
        validate_commit(&self.schema, &self.session)
    }

    /// Validate and, on approval, lock the session for submission.
    pub fn prepare_commit(&mut self) -> Result<PendingCommit, CommitError> {
        if self.is_busy() {
            return Err(SessionError::CommitInFlight.into());
        }
        self.transition(CommitState::Validating);
        let approval = match self.validate() {
            Ok(approval) => approval,
            Err(rejection) => {
                warn!(event = %self.schema.event_name, reason = %rejection, "commit rejected");
                self.transition(CommitState::Idle);
                return Err(rejection.into());
            }
        };

        let request = CommitRequest::new(self.session.additions.clone(), approval);
        info!(
            event = %self.schema.event_name,
            additions = request.additions.len(),
            deletes = request.deletes.len(),
            renames = request.renames.len(),
            "submitting schema update"
        );
        self.transition(CommitState::Submitting);
        Ok(PendingCommit {
            event_name: self.schema.event_name.clone(),
            request,
        })
    }

    /// Apply the service's answer to a prepared commit.
    ///
    /// Success reconciles the baseline; failure leaves baseline and session
    /// exactly as they were and hands the error back.
    pub fn complete_commit(
        &mut self,
        pending: PendingCommit,
        outcome: Result<(), ServiceError>,
    ) -> Result<(), CommitError> {
        if !self.is_busy() || pending.event_name != self.schema.event_name {
            return Err(CommitError::NotSubmitting(pending.event_name));
        }
        match outcome {
            Ok(()) => {
                reconcile(&mut self.schema, &mut self.session, &pending.request.renames);
                self.transition(CommitState::Reconciled);
                info!(
                    event = %self.schema.event_name,
                    columns = self.schema.columns.len(),
                    "schema update reconciled"
                );
                self.transition(CommitState::Idle);
                Ok(())
            }
            Err(err) => {
                self.transition(CommitState::Failed);
                warn!(event = %self.schema.event_name, error = %err, "schema update failed");
                self.transition(CommitState::Idle);
                Err(err.into())
            }
        }
    }

    /// Validate, submit one request, and reconcile or roll back.
    pub async fn commit<S>(&mut self, service: &S) -> Result<(), CommitError>
    where
        S: SchemaService + ?Sized,
    {
        let pending = self.prepare_commit()?;
        let outcome = service
            .update_schema(&pending.event_name, &pending.request)
            .await;
        self.complete_commit(pending, outcome)
    }
}
