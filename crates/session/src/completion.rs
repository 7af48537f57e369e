//! Completion and signature-help ranking.
//!
//! The ranking engine is stateless per call: it asks the engine for raw
//! candidates, filters them against the text already typed at the trigger
//! point, and imposes a deterministic total order. It holds no cancellation
//! state; a caller that moved on simply discards the result.
//!
//! Ordering: case-insensitive prefix matches on the typed text surface
//! first regardless of engine priority, then engine-declared match priority
//! descending, then the engine's sort key ascending as a stable tie-break.

use std::collections::HashMap;
use std::sync::Arc;

use replpad_primitives::{DocumentId, Span};

use crate::Result;
use crate::engine::{
	AnalysisEngine, CompletionCandidate, CompletionTrigger, SignatureHelp, SignatureHelpReason,
};
use crate::registry::SessionRegistry;

/// Result of one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionData {
	/// Ranked candidates. `None` means completion was not requested (or the
	/// document is unknown); `Some` with an empty vector means "no matches".
	pub items: Option<Vec<CompletionCandidate>>,
	/// Signature-help payload, when the request short-circuited into
	/// overload display.
	pub overload_provider: Option<SignatureHelp>,
	/// Whether the editor should hard-select the first item. Soft selection
	/// lets the user keep typing without accepting a default.
	pub use_hard_selection: bool,
}

impl CompletionData {
	fn not_available() -> Self {
		Self { items: None, overload_provider: None, use_hard_selection: false }
	}
}

/// Per-document completion entry point handed to the editor surface.
pub struct CompletionProvider {
	document: DocumentId,
	registry: Arc<SessionRegistry>,
	engine: Arc<dyn AnalysisEngine>,
}

impl CompletionProvider {
	/// Create a provider for one document.
	pub fn new(document: DocumentId, registry: Arc<SessionRegistry>) -> Self {
		let engine = registry.engine();
		Self { document, registry, engine }
	}

	/// Retrieve ranked completion data for the caret at `offset`.
	///
	/// Signature help wins when explicitly forced or when `trigger_char` is
	/// a registered signature-help trigger and the engine has items for the
	/// position; completion candidates are only requested otherwise.
	///
	/// # Errors
	///
	/// Engine failures propagate uncaught; the editor surface decides how
	/// to report them. An unknown document is not an error: it yields
	/// [`CompletionData::not_available`]-shaped output.
	pub async fn get_completion_data(
		&self,
		offset: usize,
		trigger_char: Option<char>,
		force_signature_help: bool,
	) -> Result<CompletionData> {
		let Some(entry) = self.registry.get_document_state(self.document) else {
			return Ok(CompletionData::not_available());
		};

		let mut overload_provider = None;
		let mut use_hard_selection = true;

		let signature_reason = if force_signature_help {
			Some(SignatureHelpReason::InvokeCommand)
		} else {
			trigger_char
				.filter(|&ch| self.engine.is_signature_help_trigger(ch))
				.map(SignatureHelpReason::TypedChar)
		};
		if let Some(reason) = signature_reason {
			overload_provider = self.engine.signature_help(self.document, offset, reason).await?;
		}

		let mut items = None;
		if overload_provider.is_none() {
			let trigger = match trigger_char {
				Some(ch) => CompletionTrigger::Insertion(ch),
				None => CompletionTrigger::Invoke,
			};
			let raw = self.engine.completions(self.document, offset, trigger).await?;
			if raw.is_empty() {
				// Explicitly empty, distinguishable from "not requested".
				items = Some(Vec::new());
			} else {
				use_hard_selection = !raw.iter().any(|item| item.suggestion_mode);
				let text = entry.source.current_text();
				items = Some(rank(self.engine.as_ref(), self.document, &text, raw));
			}
		}

		Ok(CompletionData { items, overload_provider, use_hard_selection })
	}
}

/// Filter and order raw candidates.
fn rank(
	engine: &dyn AnalysisEngine,
	document: DocumentId,
	text: &str,
	raw: Vec<CompletionCandidate>,
) -> Vec<CompletionCandidate> {
	// Filter text per distinct span, cached for this call only.
	let mut filter_texts: HashMap<Span, String> = HashMap::new();

	let mut ranked: Vec<(bool, CompletionCandidate)> = raw
		.into_iter()
		.filter_map(|item| {
			let filter_text = filter_texts
				.entry(item.span)
				.or_insert_with(|| typed_text(text, item.span))
				.clone();
			if !filter_text.is_empty() && !engine.matches_filter(document, &item, &filter_text) {
				return None;
			}
			let prefix_match = starts_with_ignore_case(&item.display_text, &filter_text);
			Some((prefix_match, item))
		})
		.collect();

	// Stable sort keeps the order fully deterministic.
	ranked.sort_by(|(a_prefix, a), (b_prefix, b)| {
		b_prefix
			.cmp(a_prefix)
			.then_with(|| b.match_priority.cmp(&a.match_priority))
			.then_with(|| a.sort_key.cmp(&b.sort_key))
	});

	ranked.into_iter().map(|(_, item)| item).collect()
}

/// The text already typed over `span`, or empty when the span does not
/// resolve against the current text.
fn typed_text(text: &str, span: Span) -> String {
	text.get(span.start..span.end()).unwrap_or_default().to_string()
}

/// Case-insensitive, Unicode-aware prefix test. An empty prefix matches
/// everything.
fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
	let mut text = text.chars().flat_map(char::to_lowercase);
	let mut prefix = prefix.chars().flat_map(char::to_lowercase);
	loop {
		match (prefix.next(), text.next()) {
			(None, _) => return true,
			(Some(_), None) => return false,
			(Some(a), Some(b)) if a != b => return false,
			_ => {}
		}
	}
}
