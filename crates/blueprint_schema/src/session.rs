//! Edit Session
//!
//! The staged, uncommitted changes an operator has made against one baseline
//! [`Schema`]. A session never touches the baseline; it is discarded and
//! rebuilt whenever the baseline is reloaded or a commit is reconciled.
//!
//! Three mutation sets are tracked:
//!
//! - **additions**: new columns, in staging order
//! - **deletes**: indices into the *baseline* column list
//! - **name map**: original outbound name -> proposed outbound name for every
//!   baseline column (identity means "not renamed")
//!
//! plus the single in-progress [`ColumnDraft`].

use crate::column::{Column, ColumnDraft, DraftError};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Errors from session mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column index {index} out of range (schema has {len} columns)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Staged addition {index} out of range ({len} staged)")]
    AdditionOutOfRange { index: usize, len: usize },

    #[error("Column '{0}' cannot be deleted (sort or distribution key)")]
    NotDeletable(String),

    #[error("A commit is in flight; wait for it to finish")]
    CommitInFlight,

    #[error(transparent)]
    Draft(#[from] DraftError),
}

/// One name-map entry: a baseline column's original and proposed outbound name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameEntry {
    pub original: String,
    pub current: String,
}

impl NameEntry {
    pub fn is_renamed(&self) -> bool {
        self.original != self.current
    }
}

/// Insertion-ordered map of original -> proposed outbound names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap {
    entries: Vec<NameEntry>,
}

impl NameMap {
    /// Identity map over a schema's outbound names, in column order.
    pub fn identity(schema: &Schema) -> Self {
        let mut map = Self::default();
        for name in schema.outbound_names() {
            map.insert_identity(name);
        }
        map
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.original == original)
            .map(|e| e.current.as_str())
    }

    pub fn contains(&self, original: &str) -> bool {
        self.get(original).is_some()
    }

    /// Point an existing entry at a new name. Returns false if absent.
    pub fn set(&mut self, original: &str, current: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.original == original) {
            Some(entry) => {
                entry.current = current.into();
                true
            }
            None => false,
        }
    }

    /// Add an identity entry unless one already exists.
    pub fn insert_identity(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push(NameEntry {
                original: name.clone(),
                current: name,
            });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts shown next to the commit button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub additions: usize,
    pub deletes: usize,
    pub renames: usize,
}

/// Staged changes against one baseline schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    pub(crate) additions: Vec<Column>,
    pub(crate) deletes: BTreeSet<usize>,
    pub(crate) name_map: NameMap,
    pub(crate) new_col: ColumnDraft,
    baseline_len: usize,
}

impl EditSession {
    /// A clean session over `schema`: nothing staged, identity name map.
    pub fn new(schema: &Schema) -> Self {
        Self {
            additions: Vec::new(),
            deletes: BTreeSet::new(),
            name_map: NameMap::identity(schema),
            new_col: ColumnDraft::make(),
            baseline_len: schema.columns.len(),
        }
    }

    pub fn additions(&self) -> &[Column] {
        &self.additions
    }

    pub fn deletes(&self) -> &BTreeSet<usize> {
        &self.deletes
    }

    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }

    pub fn draft(&self) -> &ColumnDraft {
        &self.new_col
    }

    pub fn draft_mut(&mut self) -> &mut ColumnDraft {
        &mut self.new_col
    }

    /// Replace the draft with a fresh one.
    pub fn clear_draft(&mut self) {
        self.new_col = ColumnDraft::make();
    }

    /// Stage an already-validated column. No deduplication happens here.
    pub fn stage_addition(&mut self, column: Column) {
        debug!(outbound = %column.outbound_name, "staging addition");
        self.additions.push(column);
    }

    /// Finalise the draft, stage it, and start a fresh draft.
    ///
    /// On error the draft and staged additions are left as they were.
    pub fn stage_draft(&mut self) -> Result<(), DraftError> {
        let column = self.new_col.to_column()?;
        self.stage_addition(column);
        self.clear_draft();
        Ok(())
    }

    pub fn remove_staged_addition(&mut self, index: usize) -> Result<Column, SessionError> {
        if index >= self.additions.len() {
            return Err(SessionError::AdditionOutOfRange {
                index,
                len: self.additions.len(),
            });
        }
        let column = self.additions.remove(index);
        debug!(outbound = %column.outbound_name, "removed staged addition");
        Ok(column)
    }

    /// Mark a baseline column for deletion. Staging twice is a no-op.
    pub fn stage_deletion(&mut self, baseline_index: usize) -> Result<(), SessionError> {
        if baseline_index >= self.baseline_len {
            return Err(SessionError::IndexOutOfRange {
                index: baseline_index,
                len: self.baseline_len,
            });
        }
        if self.deletes.insert(baseline_index) {
            debug!(index = baseline_index, "staging deletion");
        }
        Ok(())
    }

    /// Unmark a baseline column. Returns whether it had been marked; any
    /// other index, in range or not, is a no-op.
    pub fn unstage_deletion(&mut self, baseline_index: usize) -> bool {
        self.deletes.remove(&baseline_index)
    }

    pub fn is_staged_for_delete(&self, baseline_index: usize) -> bool {
        self.deletes.contains(&baseline_index)
    }

    /// Propose a new outbound name for a baseline column.
    pub fn rename_column(
        &mut self,
        original: &str,
        new_name: impl Into<String>,
    ) -> Result<(), SessionError> {
        let new_name = new_name.into();
        debug!(from = original, to = %new_name, "staging rename");
        if self.name_map.set(original, new_name) {
            Ok(())
        } else {
            Err(SessionError::UnknownColumn(original.to_string()))
        }
    }

    pub fn undo_rename(&mut self, original: &str) -> Result<(), SessionError> {
        if self.name_map.set(original, original) {
            Ok(())
        } else {
            Err(SessionError::UnknownColumn(original.to_string()))
        }
    }

    pub fn is_renamed(&self, original: &str) -> bool {
        matches!(self.name_map.get(original), Some(current) if current != original)
    }

    pub fn rename_count(&self) -> usize {
        self.name_map.iter().filter(|e| e.is_renamed()).count()
    }

    /// The real rename map: only entries whose name actually changes.
    pub fn renames(&self) -> BTreeMap<String, String> {
        self.name_map
            .iter()
            .filter(|e| e.is_renamed())
            .map(|e| (e.original.clone(), e.current.clone()))
            .collect()
    }

    /// Outbound names of the baseline columns marked for deletion.
    pub fn deleted_outbound_names<'a>(&self, schema: &'a Schema) -> Vec<&'a str> {
        self.deletes
            .iter()
            .filter_map(|&i| schema.column(i))
            .map(|c| c.outbound_name.as_str())
            .collect()
    }

    /// Inbound names that would exist after this session is committed.
    ///
    /// A column counts unless its outbound name belongs to a column marked
    /// for deletion; staged additions are included.
    pub fn valid_inbound_names(&self, schema: &Schema) -> BTreeSet<String> {
        let deleted: BTreeSet<&str> = self.deleted_outbound_names(schema).into_iter().collect();
        schema
            .columns
            .iter()
            .chain(self.additions.iter())
            .filter(|c| !deleted.contains(c.outbound_name.as_str()))
            .map(|c| c.inbound_name.clone())
            .collect()
    }

    /// True when nothing is staged and no name actually changes.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletes.is_empty() && self.rename_count() == 0
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            additions: self.additions.len(),
            deletes: self.deletes.len(),
            renames: self.rename_count(),
        }
    }
}
