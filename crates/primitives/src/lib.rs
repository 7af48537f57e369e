//! Leaf value types shared across the replpad workspace.
//!
//! Everything here is a plain value: spans, identity newtypes, diagnostic
//! records and the persisted fold-region record. Behavior lives in the
//! `replpad-markers` and `replpad-session` crates.

mod diagnostics;
mod fold;
mod ids;
mod span;

pub use diagnostics::{DiagnosticRecord, DiagnosticsChanged, Severity};
pub use fold::FoldRegion;
pub use ids::{DiagnosticId, DocumentId, ProjectId};
pub use span::Span;
