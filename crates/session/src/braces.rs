//! Caret-driven brace matching with a latest-wins policy.
//!
//! Every caret move supersedes any in-flight brace-match request: the
//! tracker bumps a per-document generation counter, and an async result is
//! applied only if its captured generation is still current. A superseded
//! result is discarded entirely; there are no partial overlay updates and
//! cancellation is never an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use replpad_markers::MarkerColor;
use replpad_primitives::{DocumentId, Span};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::{AnalysisEngine, BraceSpanPair};
use crate::overlay::{MarkerTag, SharedOverlay};
use crate::source::SourceContainer;

/// Tracks the matching-brace pair around the caret for one document.
pub struct BraceTracker {
	document: DocumentId,
	engine: Arc<dyn AnalysisEngine>,
	overlay: SharedOverlay,
	source: Arc<SourceContainer>,
	/// Bumped on every caret move; stale results compare against it.
	generation: Arc<AtomicU64>,
	pair: Arc<Mutex<BraceSpanPair>>,
}

impl BraceTracker {
	/// Create a tracker for one document.
	pub fn new(
		document: DocumentId,
		engine: Arc<dyn AnalysisEngine>,
		overlay: SharedOverlay,
		source: Arc<SourceContainer>,
	) -> Self {
		Self {
			document,
			engine,
			overlay,
			source,
			generation: Arc::new(AtomicU64::new(0)),
			pair: Arc::new(Mutex::new(BraceSpanPair::default())),
		}
	}

	/// React to a caret move: supersede any in-flight request and issue a
	/// new one at `offset`.
	///
	/// Returns the spawned reconciliation task, or `None` when no request
	/// was issued (no brace-matching capability, or the offset lies beyond
	/// the current text). Callers are free to ignore the handle.
	pub fn caret_moved(&self, offset: usize) -> Option<JoinHandle<()>> {
		// The bump alone cancels whatever was in flight.
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

		if !self.engine.has_brace_matching() {
			return None;
		}
		if offset > self.source.len() {
			return None;
		}

		let document = self.document;
		let engine = self.engine.clone();
		let overlay = self.overlay.clone();
		let counter = self.generation.clone();
		let pair_slot = self.pair.clone();

		Some(tokio::spawn(async move {
			let pair = match engine.matching_braces(document, offset).await {
				Ok(pair) => pair.unwrap_or_default(),
				Err(err) => {
					// Best-effort: no highlight beats a crash.
					debug!(%document, error = %err, "brace matching failed");
					return;
				}
			};

			let mut tracked = pair_slot.lock();
			if counter.load(Ordering::SeqCst) != generation {
				// A newer caret move superseded this request; drop the
				// result entirely.
				return;
			}
			*tracked = pair;

			let mut overlay = overlay.lock();
			overlay.remove_where(|tag| matches!(tag, MarkerTag::Brace(_)));
			for span in [pair.left, pair.right].into_iter().flatten() {
				overlay.create(span, MarkerColor::GOLDENROD, None, MarkerTag::Brace(generation));
			}
		}))
	}

	/// The pair the overlay currently reflects.
	pub fn current_pair(&self) -> BraceSpanPair {
		*self.pair.lock()
	}

	/// Where "jump to matching brace" should move a caret at `caret`, if
	/// anywhere.
	///
	/// Inside the left brace the caret jumps past the right one; inside the
	/// right brace (or exactly at its end) it jumps to the left one's start.
	pub fn jump_target(&self, caret: usize) -> Option<usize> {
		let pair = self.current_pair();
		let (Some(left), Some(right)) = (pair.left, pair.right) else {
			return None;
		};
		if left.contains(caret) {
			Some(right.end())
		} else if right.contains(caret) || caret == right.end() {
			Some(left.start)
		} else {
			None
		}
	}
}

/// Span pair accessors used by the highlight renderer.
impl BraceTracker {
	/// The highlighted left span, if any.
	pub fn left(&self) -> Option<Span> {
		self.pair.lock().left
	}

	/// The highlighted right span, if any.
	pub fn right(&self) -> Option<Span> {
		self.pair.lock().right
	}
}
