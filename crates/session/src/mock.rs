//! Scriptable [`AnalysisEngine`] used across the crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use replpad_primitives::{DocumentId, Span};
use tokio::sync::Notify;

use crate::engine::{
	AnalysisEngine, BlockSpan, BraceSpanPair, CompletionCandidate, CompletionTrigger,
	DiagnosticsSink, EngineError, SignatureHelp, SignatureHelpReason,
};
use crate::project::ProjectState;
use crate::source::SourceContainer;

/// One recorded `register_document` call.
#[derive(Clone)]
pub struct Registration {
	pub document: DocumentId,
	pub project: ProjectState,
	pub source: Arc<SourceContainer>,
}

/// A canned engine whose every reply is configured up front.
///
/// Brace replies are keyed by request offset so a test can gate one request
/// behind a [`Notify`] while letting a later one complete immediately.
#[derive(Default)]
pub struct MockEngine {
	completions: Mutex<Vec<CompletionCandidate>>,
	rejected: Mutex<HashSet<String>>,
	signature_triggers: Vec<char>,
	signature_help: Mutex<Option<SignatureHelp>>,
	#[allow(clippy::type_complexity)]
	braces: Mutex<HashMap<usize, (Option<Arc<Notify>>, Option<BraceSpanPair>)>>,
	no_brace_matching: bool,
	brace_error: Mutex<Option<String>>,
	blocks: Mutex<Vec<BlockSpan>>,
	block_error: Mutex<Option<String>>,
	register_error: Mutex<Option<String>>,
	register_limit: Mutex<Option<usize>>,
	register_gate: Mutex<Option<Arc<Notify>>>,
	pub block_calls: AtomicUsize,
	pub warm_ups: AtomicUsize,
	pub registrations: Mutex<Vec<Registration>>,
	pub removed: Mutex<Vec<DocumentId>>,
}

impl MockEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_completions(self, items: Vec<CompletionCandidate>) -> Self {
		*self.completions.lock() = items;
		self
	}

	/// Candidates whose display text is listed here fail `matches_filter`.
	pub fn with_rejected(self, display_texts: &[&str]) -> Self {
		*self.rejected.lock() = display_texts.iter().map(|text| (*text).to_string()).collect();
		self
	}

	pub fn with_signature_triggers(mut self, triggers: &[char]) -> Self {
		self.signature_triggers = triggers.to_vec();
		self
	}

	pub fn with_signature_help(self, help: SignatureHelp) -> Self {
		*self.signature_help.lock() = Some(help);
		self
	}

	/// Script the brace reply for a request at `offset`, optionally gated.
	pub fn with_brace_reply(self, offset: usize, gate: Option<Arc<Notify>>, pair: Option<BraceSpanPair>) -> Self {
		self.braces.lock().insert(offset, (gate, pair));
		self
	}

	pub fn with_brace_error(self, message: &str) -> Self {
		*self.brace_error.lock() = Some(message.to_string());
		self
	}

	pub fn without_brace_matching(mut self) -> Self {
		self.no_brace_matching = true;
		self
	}

	pub fn with_blocks(self, blocks: Vec<BlockSpan>) -> Self {
		*self.blocks.lock() = blocks;
		self
	}

	pub fn with_block_error(self, message: &str) -> Self {
		*self.block_error.lock() = Some(message.to_string());
		self
	}

	pub fn with_register_error(self, message: &str) -> Self {
		*self.register_error.lock() = Some(message.to_string());
		self
	}

	/// Reject every registration after the first `limit` have succeeded.
	pub fn with_register_limit(self, limit: usize) -> Self {
		*self.register_limit.lock() = Some(limit);
		self
	}

	/// Park the next `register_document` call on `gate` until notified.
	pub fn gate_next_registration(&self, gate: Arc<Notify>) {
		*self.register_gate.lock() = Some(gate);
	}

	pub fn registered_documents(&self) -> Vec<DocumentId> {
		self.registrations.lock().iter().map(|reg| reg.document).collect()
	}
}

#[async_trait]
impl AnalysisEngine for MockEngine {
	async fn register_document(
		&self,
		document: DocumentId,
		project: &ProjectState,
		source: Arc<SourceContainer>,
		_diagnostics: DiagnosticsSink,
	) -> Result<(), EngineError> {
		let gate = self.register_gate.lock().take();
		if let Some(gate) = gate {
			gate.notified().await;
		}
		if let Some(message) = self.register_error.lock().clone() {
			return Err(EngineError::new(message));
		}
		if let Some(limit) = *self.register_limit.lock() {
			if self.registrations.lock().len() >= limit {
				return Err(EngineError::new("registration rejected"));
			}
		}
		self.registrations.lock().push(Registration { document, project: project.clone(), source });
		Ok(())
	}

	async fn remove_document(&self, document: DocumentId) {
		self.removed.lock().push(document);
	}

	async fn completions(
		&self,
		_document: DocumentId,
		_offset: usize,
		_trigger: CompletionTrigger,
	) -> Result<Vec<CompletionCandidate>, EngineError> {
		Ok(self.completions.lock().clone())
	}

	fn matches_filter(&self, _document: DocumentId, candidate: &CompletionCandidate, _filter_text: &str) -> bool {
		!self.rejected.lock().contains(&candidate.display_text)
	}

	fn is_signature_help_trigger(&self, ch: char) -> bool {
		self.signature_triggers.contains(&ch)
	}

	async fn signature_help(
		&self,
		_document: DocumentId,
		_offset: usize,
		_reason: SignatureHelpReason,
	) -> Result<Option<SignatureHelp>, EngineError> {
		Ok(self.signature_help.lock().clone())
	}

	fn has_brace_matching(&self) -> bool {
		!self.no_brace_matching
	}

	async fn matching_braces(
		&self,
		_document: DocumentId,
		offset: usize,
	) -> Result<Option<BraceSpanPair>, EngineError> {
		if let Some(message) = self.brace_error.lock().clone() {
			return Err(EngineError::new(message));
		}
		let reply = self.braces.lock().get(&offset).cloned();
		let Some((gate, pair)) = reply else {
			return Ok(None);
		};
		if let Some(gate) = gate {
			gate.notified().await;
		}
		Ok(pair)
	}

	async fn block_structure(&self, _document: DocumentId) -> Result<Vec<BlockSpan>, EngineError> {
		self.block_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(message) = self.block_error.lock().clone() {
			return Err(EngineError::new(message));
		}
		Ok(self.blocks.lock().clone())
	}

	fn warm_up(&self) {
		self.warm_ups.fetch_add(1, Ordering::SeqCst);
	}
}

/// A convenience candidate with neutral priority.
pub fn candidate(display: &str, span: Span) -> CompletionCandidate {
	CompletionCandidate {
		display_text: display.to_string(),
		sort_key: display.to_string(),
		match_priority: 0,
		span,
		suggestion_mode: false,
	}
}
