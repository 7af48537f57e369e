//! Diagnostic records and change events.

use crate::{DiagnosticId, DocumentId, Span};

/// How severe a diagnostic is.
///
/// `Hidden` diagnostics exist for analysis purposes only and are never
/// surfaced visually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
	/// Not user-visible.
	Hidden,
	/// Informational note.
	Info,
	/// Possible problem.
	Warning,
	/// Definite problem.
	Error,
}

/// One diagnostic produced by an analysis pass.
///
/// Two records describing the same diagnostic across re-analysis passes are
/// matched by [`DiagnosticRecord::id`], not by content. The analysis engine
/// is expected not to re-add an unchanged diagnostic without removing it
/// first; the synchronizer does not deduplicate adds.
#[derive(Debug, Clone)]
pub struct DiagnosticRecord {
	/// Identity used to match add/remove pairs.
	pub id: DiagnosticId,
	/// The document the diagnostic belongs to.
	pub document: DocumentId,
	/// Severity class.
	pub severity: Severity,
	/// Where in the document the diagnostic applies, when resolvable.
	pub span: Option<Span>,
	/// Human-readable message.
	pub message: String,
	/// Whether the diagnostic was suppressed (pragma, attribute, config).
	pub suppressed: bool,
}

/// One batch of diagnostic changes for a document, as delivered by the
/// workspace's re-analysis feed.
#[derive(Debug, Clone)]
pub struct DiagnosticsChanged {
	/// The document the batch applies to.
	pub document: DocumentId,
	/// Records that became live in this pass.
	pub added: Vec<DiagnosticRecord>,
	/// Records superseded by this pass.
	pub removed: Vec<DiagnosticRecord>,
}

impl DiagnosticsChanged {
	/// A batch that only adds records to `document`.
	pub fn added(document: DocumentId, added: Vec<DiagnosticRecord>) -> Self {
		Self { document, added, removed: Vec::new() }
	}

	/// A batch that only removes records from `document`.
	pub fn removed(document: DocumentId, removed: Vec<DiagnosticRecord>) -> Self {
		Self { document, added: Vec::new(), removed }
	}
}
