//! Commit validation
//!
//! [`validate_commit`] decides whether an [`EditSession`] may be committed
//! against its baseline [`Schema`]. Checks run in a fixed order and the first
//! failure wins, so an operator always sees exactly one reason:
//!
//! 1. the `time` column is neither deleted nor renamed
//! 2. no addition or rename targets a reserved outbound name
//! 3. surviving baseline columns still resolve their mapping column
//! 4. retained baseline columns end up with distinct outbound names
//! 5. additions collide with nothing and resolve their mapping column
//! 6. no name takes part in more than one rename
//! 7. the add-column draft is not half filled
//! 8. something actually changes
//!
//! Validation is pure; a rejection leaves session and baseline untouched.

use crate::policy::{is_reserved_outbound_name, PROTECTED_COLUMN};
use crate::schema::Schema;
use crate::session::EditSession;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Why a commit was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Cannot delete the time column.")]
    DeleteTimeColumn,

    #[error("Cannot rename the time column.")]
    RenameTimeColumn,

    #[error("Cannot have an outbound name '{name}'. It is a reserved identifier.")]
    ReservedOutboundName { name: String },

    #[error("Can't have a column using a mapping that is going to be deleted. Offending name: {column}")]
    DanglingMapping { column: String },

    #[error("Duplicate name. Offending name: {name}")]
    DuplicateName { name: String },

    #[error("Can't add a column while renaming away from it. Offending name: {name}")]
    AddWhileRenamingAway { name: String },

    #[error("Can't add a column using a mapping that was or is going to be deleted. Offending name: {column}")]
    AdditionMappingMissing { column: String },

    #[error("A column cannot map through its own inbound name. Offending name: {column}")]
    SelfReferencingMapping { column: String },

    #[error("Cannot rename from or to a column that was already renamed from or to. Offending name: {name}")]
    RenameConflict { name: String },

    #[error("Column addition not finished. Stage the column or clear the inbound and outbound name.")]
    UnfinishedDraft,

    #[error("No change to columns, so no action taken.")]
    NothingToDo,
}

impl Rejection {
    /// The column or name the rejection is about, when there is one.
    pub fn offending_name(&self) -> Option<&str> {
        match self {
            Rejection::DeleteTimeColumn | Rejection::RenameTimeColumn => Some(PROTECTED_COLUMN),
            Rejection::ReservedOutboundName { name }
            | Rejection::DuplicateName { name }
            | Rejection::AddWhileRenamingAway { name }
            | Rejection::RenameConflict { name } => Some(name),
            Rejection::DanglingMapping { column }
            | Rejection::AdditionMappingMissing { column }
            | Rejection::SelfReferencingMapping { column } => Some(column),
            Rejection::UnfinishedDraft | Rejection::NothingToDo => None,
        }
    }
}

/// A validated change set, resolved against the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Outbound names being removed, in baseline order
    pub deletes: Vec<String>,
    /// Old outbound name -> new outbound name, renamed columns only
    pub renames: BTreeMap<String, String>,
}

/// Check every commit invariant; the first violation is returned.
pub fn validate_commit(schema: &Schema, session: &EditSession) -> Result<Approval, Rejection> {
    let deletes: Vec<&str> = session.deleted_outbound_names(schema);
    let deleted: HashSet<&str> = deletes.iter().copied().collect();
    let inbound_names = session.valid_inbound_names(schema);

    if deleted.contains(PROTECTED_COLUMN) {
        return Err(Rejection::DeleteTimeColumn);
    }
    if matches!(session.name_map.get(PROTECTED_COLUMN), Some(name) if name != PROTECTED_COLUMN) {
        return Err(Rejection::RenameTimeColumn);
    }

    for column in &session.additions {
        if is_reserved_outbound_name(&column.outbound_name) {
            return Err(Rejection::ReservedOutboundName {
                name: column.outbound_name.clone(),
            });
        }
    }
    for entry in session.name_map.iter().filter(|e| e.is_renamed()) {
        if is_reserved_outbound_name(&entry.current) {
            return Err(Rejection::ReservedOutboundName {
                name: entry.current.clone(),
            });
        }
    }

    for column in &schema.columns {
        if deleted.contains(column.outbound_name.as_str()) {
            continue;
        }
        if let Some(supporting) = column.supporting_column() {
            if !inbound_names.contains(supporting) {
                return Err(Rejection::DanglingMapping {
                    column: column.outbound_name.clone(),
                });
            }
        }
    }

    // Names held by retained baseline columns, before and after renaming.
    let mut new_names: HashSet<&str> = HashSet::new();
    let mut old_names: HashSet<&str> = HashSet::new();
    for entry in session.name_map.iter() {
        if deleted.contains(entry.original.as_str()) {
            continue;
        }
        old_names.insert(&entry.original);
        if !new_names.insert(&entry.current) {
            return Err(Rejection::DuplicateName {
                name: entry.current.clone(),
            });
        }
    }

    for column in &session.additions {
        let name = column.outbound_name.as_str();
        if !new_names.insert(name) {
            return Err(Rejection::DuplicateName {
                name: name.to_string(),
            });
        }
        if old_names.contains(name) {
            return Err(Rejection::AddWhileRenamingAway {
                name: name.to_string(),
            });
        }
        match column.supporting_column() {
            Some(supporting) if !inbound_names.contains(supporting) => {
                return Err(Rejection::AdditionMappingMissing {
                    column: name.to_string(),
                });
            }
            Some(supporting) if supporting == column.inbound_name => {
                return Err(Rejection::SelfReferencingMapping {
                    column: name.to_string(),
                });
            }
            None if column.using_mapping_transformer() => {
                return Err(Rejection::AdditionMappingMissing {
                    column: name.to_string(),
                });
            }
            _ => {}
        }
    }

    // Renames of columns being deleted are moot and are not submitted.
    let mut renames = BTreeMap::new();
    let mut name_set: HashSet<&str> = HashSet::new();
    for entry in session.name_map.iter() {
        if !entry.is_renamed() || deleted.contains(entry.original.as_str()) {
            continue;
        }
        if name_set.contains(entry.current.as_str()) {
            return Err(Rejection::RenameConflict {
                name: entry.current.clone(),
            });
        }
        if name_set.contains(entry.original.as_str()) {
            return Err(Rejection::RenameConflict {
                name: entry.original.clone(),
            });
        }
        name_set.insert(&entry.current);
        name_set.insert(&entry.original);
        renames.insert(entry.original.clone(), entry.current.clone());
    }

    if session.new_col.is_started() {
        return Err(Rejection::UnfinishedDraft);
    }

    if session.additions.is_empty() && deletes.is_empty() && renames.is_empty() {
        return Err(Rejection::NothingToDo);
    }

    Ok(Approval {
        deletes: deletes.into_iter().map(str::to_string).collect(),
        renames,
    })
}
