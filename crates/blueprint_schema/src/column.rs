//! Column model
//!
//! A [`Column`] is one outbound field of an event schema. A [`ColumnDraft`] is
//! the half-filled form an operator edits before staging it; drafts carry raw
//! text (`size`, `mappingColumn`) and only become columns through
//! [`ColumnDraft::to_column`].

use crate::transformer::{Transformer, TransformerKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default size offered for a new bounded-string column.
pub const DEFAULT_DRAFT_SIZE: u32 = 255;

/// Errors raised while turning a draft into a column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("New column is invalid")]
    Invalid,

    #[error("New column is invalid (needs nonempty value)")]
    InvalidSize { raw: String },

    #[error("New column is invalid (needs nonempty mapping column)")]
    MissingMappingColumn,

    #[error("New column is invalid (mapping column cannot be the column itself: {0})")]
    SelfReferencingMapping(String),
}

/// One outbound column of a schema, in the persistence service's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Source event property
    #[serde(rename = "InboundName")]
    pub inbound_name: String,

    /// Column name visible downstream
    #[serde(rename = "OutboundName")]
    pub outbound_name: String,

    #[serde(rename = "Transformer")]
    pub transformer: Transformer,

    /// Storage hints such as `(255)`, `sortkey`, `distkey`
    #[serde(rename = "ColumnCreationOptions", default)]
    pub column_creation_options: String,

    /// Inbound name this column maps through; empty when unused
    #[serde(rename = "SupportingColumns", default)]
    pub supporting_columns: String,

    /// Bounded-string size when known explicitly
    #[serde(rename = "size", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl Column {
    pub fn new(
        inbound_name: impl Into<String>,
        outbound_name: impl Into<String>,
        transformer: impl Into<Transformer>,
    ) -> Self {
        Self {
            inbound_name: inbound_name.into(),
            outbound_name: outbound_name.into(),
            transformer: transformer.into(),
            column_creation_options: String::new(),
            supporting_columns: String::new(),
            size: None,
        }
    }

    /// Set the bounded-string size; also writes the `(N)` creation option.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self.column_creation_options = format!("({})", size);
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.column_creation_options = options.into();
        self
    }

    pub fn with_supporting_column(mut self, inbound_name: impl Into<String>) -> Self {
        self.supporting_columns = inbound_name.into();
        self
    }

    /// The supporting column reference, if any.
    pub fn supporting_column(&self) -> Option<&str> {
        if self.supporting_columns.is_empty() {
            None
        } else {
            Some(&self.supporting_columns)
        }
    }

    /// Bounded-string size, falling back to a leading `(N)` creation option.
    pub fn bounded_size(&self) -> Option<u32> {
        self.size.or_else(|| {
            let opts = self.column_creation_options.trim_start();
            let inner = opts.strip_prefix('(')?;
            let end = inner.find(')')?;
            inner[..end].trim().parse().ok()
        })
    }

    /// Structural validity of this column on its own.
    ///
    /// Names and transformer must be non-empty; bounded strings need a size in
    /// `(0, max_size]`.
    pub fn validate(&self) -> bool {
        if self.inbound_name.is_empty() || self.outbound_name.is_empty() || self.transformer.is_empty()
        {
            return false;
        }
        match self.transformer.kind() {
            TransformerKind::BoundedString { max_size } => {
                matches!(self.bounded_size(), Some(n) if n > 0 && n <= max_size)
            }
            TransformerKind::Scalar | TransformerKind::MappingTransformer { .. } => true,
        }
    }

    pub fn using_mapping_transformer(&self) -> bool {
        self.transformer.is_mapping()
    }
}

/// The in-progress "add column" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDraft {
    pub inbound_name: String,
    pub outbound_name: String,
    pub transformer: Transformer,
    /// Raw size text as typed
    pub size: String,
    pub column_creation_options: String,
    /// Inbound name a mapping transformer resolves through
    pub mapping_column: String,
}

impl Default for ColumnDraft {
    fn default() -> Self {
        Self::make()
    }
}

impl ColumnDraft {
    /// A fresh draft: empty names, `varchar` with the default size.
    pub fn make() -> Self {
        Self {
            inbound_name: String::new(),
            outbound_name: String::new(),
            transformer: Transformer::Varchar,
            size: DEFAULT_DRAFT_SIZE.to_string(),
            column_creation_options: String::new(),
            mapping_column: String::new(),
        }
    }

    /// True once the operator has typed either name.
    pub fn is_started(&self) -> bool {
        !self.inbound_name.is_empty() || !self.outbound_name.is_empty()
    }

    /// Finalise the draft into a column ready to stage.
    pub fn to_column(&self) -> Result<Column, DraftError> {
        if self.inbound_name.is_empty() || self.outbound_name.is_empty() || self.transformer.is_empty()
        {
            return Err(DraftError::Invalid);
        }

        let mut column = Column::new(
            self.inbound_name.clone(),
            self.outbound_name.clone(),
            self.transformer.clone(),
        )
        .with_options(self.column_creation_options.clone());

        match self.transformer.kind() {
            TransformerKind::BoundedString { .. } => {
                let size: u32 = self
                    .size
                    .trim()
                    .parse()
                    .map_err(|_| DraftError::InvalidSize { raw: self.size.clone() })?;
                column = column.with_size(size);
            }
            TransformerKind::MappingTransformer { supporting_column_required } => {
                if self.mapping_column.is_empty() {
                    if supporting_column_required {
                        return Err(DraftError::MissingMappingColumn);
                    }
                } else if self.mapping_column == self.inbound_name {
                    return Err(DraftError::SelfReferencingMapping(self.mapping_column.clone()));
                } else {
                    column = column.with_supporting_column(self.mapping_column.clone());
                }
            }
            TransformerKind::Scalar => {}
        }

        if !column.validate() {
            return Err(DraftError::Invalid);
        }
        Ok(column)
    }
}
