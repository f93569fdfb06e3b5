//! Schema Edit Sessions
//!
//! # Lifecycle
//!
//! An event's outbound column layout evolves through staged edits that are
//! committed as one atomic update:
//!
//! 1. **Load**: a baseline [`Schema`] is fetched from the persistence service
//! 2. **Stage**: additions, deletions, and renames accumulate in an
//!    [`EditSession`]; the baseline is never touched speculatively
//! 3. **Validate**: [`validate_commit`] checks every cross-column invariant
//!    and reports the first violation
//! 4. **Submit**: one request carries the whole change set
//! 5. **Reconcile**: on success the change set is folded into the baseline
//!    and the session starts over; on failure nothing changes
//!
//! # Modules
//!
//! - [`transformer`]: closed catalog of column transformers
//! - [`column`]: column model, drafts, and per-column validation
//! - [`schema`]: baseline schema
//! - [`policy`]: protected, reserved, and non-deletable columns
//! - [`session`]: the staged mutation sets
//! - [`validation`]: commit-time invariant checks
//! - [`commit`]: commit state machine and reconciliation
//! - [`service`]: persistence service seam and its HTTP client

pub mod column;
pub mod commit;
pub mod policy;
pub mod schema;
pub mod service;
pub mod session;
pub mod transformer;
pub mod validation;

pub use column::{Column, ColumnDraft, DraftError};
pub use commit::{
    reconcile, remove_indices, CommitError, CommitRequest, CommitState, PendingCommit,
    SchemaEditor,
};
pub use policy::{is_column_deletable, is_reserved_outbound_name};
pub use schema::Schema;
pub use service::{HttpSchemaService, SchemaService, ServiceError};
pub use session::{EditSession, NameEntry, NameMap, SessionError, SessionSummary};
pub use transformer::{Transformer, TransformerKind};
pub use validation::{validate_commit, Approval, Rejection};
