//! The analysis-engine boundary.
//!
//! Everything the language analysis collaborator does for us is reachable
//! through [`AnalysisEngine`]. The core only ever calls this trait, never
//! implements it: parsing, binding, candidate production and brace/block
//! computation all live on the other side. Engine failures are surfaced as
//! [`EngineError`] and propagate unchanged to whoever made the request.

use std::sync::Arc;

use async_trait::async_trait;
use replpad_primitives::{DiagnosticsChanged, DocumentId, Span};
use tokio::sync::broadcast;

use crate::project::ProjectState;
use crate::source::SourceContainer;

/// Sink the engine publishes diagnostic-change batches into.
///
/// Each workspace owns one such channel; every document registered into the
/// workspace hands the engine a clone of its sender.
pub type DiagnosticsSink = broadcast::Sender<DiagnosticsChanged>;

/// An error reported by the analysis engine.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
	/// Convenience constructor.
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// How a completion request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTrigger {
	/// Explicit invocation with no trigger character.
	Invoke,
	/// The user typed this character.
	Insertion(char),
}

/// Why signature help is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureHelpReason {
	/// The explicit signature-help command.
	InvokeCommand,
	/// The user typed a registered signature-help trigger character.
	TypedChar(char),
}

/// One raw completion candidate as produced by the engine.
///
/// Immutable once produced; the ranking engine reorders and filters but
/// never mutates fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
	/// Text shown in the completion list.
	pub display_text: String,
	/// Engine-declared tie-break key; ascending, deterministic.
	pub sort_key: String,
	/// Engine-declared priority; higher surfaces earlier among equals.
	pub match_priority: i32,
	/// The span of already-typed text this candidate would replace.
	pub span: Span,
	/// Engine flagged this as the designated suggestion-mode item.
	pub suggestion_mode: bool,
}

/// Signature-help payload handed to the editor's overload display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHelp {
	/// Rendered signatures, one per overload.
	pub signatures: Vec<String>,
	/// Index of the signature to show first.
	pub active_signature: usize,
	/// Index of the parameter the caret sits in, when known.
	pub active_parameter: Option<usize>,
}

/// The matching-brace pair around a caret position.
///
/// Recomputed wholesale on every caret move, never partially updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BraceSpanPair {
	/// The opening brace, if one was found.
	pub left: Option<Span>,
	/// The closing brace, if one was found.
	pub right: Option<Span>,
}

/// One block-structure span, the raw material for a fold region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
	/// The text range the block covers.
	pub span: Span,
	/// Banner text shown while the block is collapsed.
	pub banner_text: String,
}

/// The language analysis collaborator.
///
/// All methods taking a [`DocumentId`] refer to documents previously handed
/// to [`AnalysisEngine::register_document`]; behavior for unregistered ids is
/// engine-defined but must not panic.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
	/// Create or update the engine-side snapshot for a document.
	///
	/// `diagnostics` is where re-analysis passes for this document publish
	/// their added/removed record batches.
	async fn register_document(
		&self,
		document: DocumentId,
		project: &ProjectState,
		source: Arc<SourceContainer>,
		diagnostics: DiagnosticsSink,
	) -> Result<(), EngineError>;

	/// Drop the engine-side snapshot for a document.
	async fn remove_document(&self, document: DocumentId);

	/// Raw completion candidates at `offset`.
	///
	/// An empty vector means the engine has nothing to offer here.
	async fn completions(
		&self,
		document: DocumentId,
		offset: usize,
		trigger: CompletionTrigger,
	) -> Result<Vec<CompletionCandidate>, EngineError>;

	/// The engine's own filter predicate: does `candidate` survive the
	/// already-typed `filter_text`? Only consulted for non-empty filter text.
	fn matches_filter(&self, document: DocumentId, candidate: &CompletionCandidate, filter_text: &str) -> bool;

	/// Whether `ch` is a registered signature-help trigger character.
	fn is_signature_help_trigger(&self, ch: char) -> bool;

	/// Signature-help items at `offset`, or `None` when the position has no
	/// enclosing invocation.
	async fn signature_help(
		&self,
		document: DocumentId,
		offset: usize,
		reason: SignatureHelpReason,
	) -> Result<Option<SignatureHelp>, EngineError>;

	/// Whether a brace-matching capability is available at all.
	fn has_brace_matching(&self) -> bool {
		true
	}

	/// The matching brace pair around `offset`.
	async fn matching_braces(
		&self,
		document: DocumentId,
		offset: usize,
	) -> Result<Option<BraceSpanPair>, EngineError>;

	/// Block-structure spans for the whole document.
	async fn block_structure(&self, document: DocumentId) -> Result<Vec<BlockSpan>, EngineError>;

	/// One-time start-up work, e.g. priming completion providers so first
	/// keystrokes respond quickly. The registry guarantees at most one call
	/// per registry instance.
	fn warm_up(&self) {}
}
