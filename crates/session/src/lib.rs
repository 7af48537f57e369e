//! Session and workspace orchestration for a REPL-like live editor.
//!
//! Each open document is backed by an isolated analysis [`Workspace`];
//! successive script submissions chain onto one another so declarations from
//! an earlier submission stay visible to later ones. The language analysis
//! itself (parsing, binding, IntelliSense) is a collaborator behind the
//! [`AnalysisEngine`] trait; this crate owns the orchestration around it:
//!
//! - [`SessionRegistry`]: document lifecycle, workspace arena, project
//!   chaining ([`registry`], [`project`], [`workspace`]).
//! - [`CompletionProvider`]: stateless-per-call completion and
//!   signature-help ranking ([`completion`]).
//! - [`diagnostics`]: reconciles added/removed diagnostic sets onto the
//!   marker overlay via a cancellable subscription.
//! - [`BraceTracker`]: latest-wins brace matching driven by caret motion
//!   ([`braces`]).
//! - [`FoldingSync`]: debounced, best-effort structural folding ([`folding`]).
//!
//! # Threading
//!
//! Overlay and fold state belong to the editor surface. All engine calls are
//! async; results are applied in short synchronous critical sections, and a
//! stale async result is discarded by generation check before it can touch
//! shared state. Locks are never held across an `.await`.

use replpad_primitives::DocumentId;

pub mod braces;
pub mod completion;
pub mod diagnostics;
pub mod engine;
pub mod folding;
pub mod overlay;
pub mod project;
pub mod registry;
pub mod source;
pub mod workspace;

#[cfg(test)]
pub(crate) mod mock;

pub use braces::BraceTracker;
pub use completion::{CompletionData, CompletionProvider};
pub use diagnostics::DiagnosticsSubscription;
pub use engine::{
	AnalysisEngine, BlockSpan, BraceSpanPair, CompletionCandidate, CompletionTrigger,
	DiagnosticsSink, EngineError, SignatureHelp, SignatureHelpReason,
};
pub use folding::{FOLD_DEBOUNCE, FoldingManager, FoldingSync};
pub use overlay::{EditorOverlay, MarkerTag, SharedOverlay, shared_overlay};
pub use project::{
	BuiltProject, CompilationOptions, DocumentCreationArgs, ProjectBuilder, ProjectState,
	SourceKind, default_project_builder,
};
pub use registry::{SessionConfig, SessionRegistry, WorkspaceIndex};
pub use source::SourceContainer;
pub use workspace::{DocumentEntry, Solution, Workspace};

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
///
/// Lifecycle operations fail closed: referencing an unknown document is a
/// safe no-op almost everywhere and only surfaces as [`Error::UnknownDocument`]
/// where the operation cannot proceed without it. [`Error::Cancelled`] is
/// never an error in the asynchronous pipelines; superseded requests are
/// swallowed silently.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The operation referenced an identity no live workspace owns.
	#[error("no live workspace owns {0}")]
	UnknownDocument(DocumentId),
	/// Malformed creation arguments. Fatal to the call, not to the process.
	#[error("invalid creation arguments: {0}")]
	InvalidArgument(String),
	/// A newer request superseded this one.
	#[error("superseded by a newer request")]
	Cancelled,
	/// A programming-contract breach (unrecognized severity, chain
	/// inconsistency). Loud in debug builds.
	#[error("contract violation: {0}")]
	InvalidState(String),
	/// The analysis engine failed; propagated unchanged to the caller.
	#[error(transparent)]
	Engine(#[from] EngineError),
}
