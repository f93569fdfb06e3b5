//! Edit plans
//!
//! An edit plan is a TOML file describing one change set:
//!
//! ```toml
//! [[add]]
//! inbound = "ip"
//! outbound = "city"
//! transformer = "ipCity"
//!
//! [[add]]
//! inbound = "referrer"
//! outbound = "referrer"
//! size = 512
//!
//! [[delete]]
//! column = "legacy_flag"
//!
//! [[delete]]
//! index = 4
//!
//! [[rename]]
//! from = "ip"
//! to = "ip_address"
//! ```
//!
//! Additions go through the same draft form an operator fills in by hand, so
//! size and mapping rules are enforced before anything is staged.

use blueprint_schema::{SchemaEditor, SessionError, Transformer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid plan {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Plan has no additions, deletions, or renames")]
    Empty,

    #[error("Addition #{position} ({outbound}): {source}")]
    Addition {
        position: usize,
        outbound: String,
        source: SessionError,
    },

    #[error("Delete {target}: no such column in the schema")]
    UnknownColumn { target: String },

    #[error("Delete {target}: {source}")]
    Deletion { target: String, source: SessionError },

    #[error("Rename {from} -> {to}: {source}")]
    Rename {
        from: String,
        to: String,
        source: SessionError,
    },
}

/// One `[[add]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEntry {
    pub inbound: String,
    pub outbound: String,
    #[serde(default)]
    pub transformer: Transformer,
    /// Width for bounded strings; the draft default applies when omitted
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub options: String,
    /// Inbound column a mapping transformer resolves through
    #[serde(default)]
    pub mapping_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteByName {
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteByIndex {
    pub index: usize,
}

/// One `[[delete]]` entry: by outbound name or by baseline index, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeleteEntry {
    Column(DeleteByName),
    Index(DeleteByIndex),
}

impl DeleteEntry {
    pub fn column(name: impl Into<String>) -> Self {
        DeleteEntry::Column(DeleteByName { column: name.into() })
    }

    pub fn index(index: usize) -> Self {
        DeleteEntry::Index(DeleteByIndex { index })
    }
}

impl std::fmt::Display for DeleteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteEntry::Column(by_name) => write!(f, "'{}'", by_name.column),
            DeleteEntry::Index(by_index) => write!(f, "#{}", by_index.index),
        }
    }
}

/// One `[[rename]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameEntry {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditPlan {
    #[serde(default)]
    pub add: Vec<AddEntry>,
    #[serde(default)]
    pub delete: Vec<DeleteEntry>,
    #[serde(default)]
    pub rename: Vec<RenameEntry>,
}

impl EditPlan {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty() && self.rename.is_empty()
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, PlanError> {
        toml::from_str(content).map_err(|source| PlanError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Stage every entry on `editor`: deletions, then renames, then additions.
    ///
    /// Stops at the first entry that cannot be staged. Entries staged before
    /// the failure stay staged; callers discard the editor on error.
    pub fn apply(&self, editor: &mut SchemaEditor) -> Result<(), PlanError> {
        if self.is_empty() {
            return Err(PlanError::Empty);
        }

        for entry in &self.delete {
            let index = match entry {
                DeleteEntry::Column(by_name) => editor.schema().position_of(&by_name.column),
                DeleteEntry::Index(by_index) => Some(by_index.index),
            }
            .ok_or_else(|| PlanError::UnknownColumn {
                target: entry.to_string(),
            })?;
            editor
                .stage_deletion(index)
                .map_err(|source| PlanError::Deletion {
                    target: entry.to_string(),
                    source,
                })?;
        }

        for entry in &self.rename {
            editor
                .rename_column(&entry.from, entry.to.clone())
                .map_err(|source| PlanError::Rename {
                    from: entry.from.clone(),
                    to: entry.to.clone(),
                    source,
                })?;
        }

        for (i, entry) in self.add.iter().enumerate() {
            let addition_error = |source: SessionError| PlanError::Addition {
                position: i + 1,
                outbound: entry.outbound.clone(),
                source,
            };
            let draft = editor.draft_mut().map_err(addition_error)?;
            draft.inbound_name = entry.inbound.clone();
            draft.outbound_name = entry.outbound.clone();
            draft.transformer = entry.transformer.clone();
            if let Some(size) = entry.size {
                draft.size = size.to_string();
            }
            draft.column_creation_options = entry.options.clone();
            draft.mapping_column = entry.mapping_column.clone();

            if let Err(source) = editor.stage_draft() {
                // leave no half-filled draft behind
                editor.clear_draft().map_err(addition_error)?;
                return Err(addition_error(source));
            }
        }

        Ok(())
    }
}
