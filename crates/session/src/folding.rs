//! Debounced structural-folding recomputation.
//!
//! Text-change bursts restart a quiescence window instead of queuing
//! recomputes; only the last change's recompute fires. The fold set is
//! handed to the external folding manager in one atomic replace. Folding is
//! best-effort: every failure is swallowed and simply leaves the previous
//! folds in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use replpad_primitives::{DocumentId, FoldRegion};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::AnalysisEngine;

/// Quiescence window after the last text change before folds recompute.
pub const FOLD_DEBOUNCE: Duration = Duration::from_secs(2);

/// The external folding-manager collaborator.
pub trait FoldingManager: Send + Sync {
	/// Replace the entire fold set in one update. `first_error_offset` is
	/// the offset from which stale folds should be re-validated; `None`
	/// leaves collapsed state untouched.
	fn replace_all(&self, folds: Vec<FoldRegion>, first_error_offset: Option<usize>);

	/// The current fold set in start-offset order, with collapsed state.
	fn snapshot(&self) -> Vec<FoldRegion>;

	/// Drop every fold region.
	fn clear(&self);
}

/// Recomputes fold regions for one document, debounced on text changes.
pub struct FoldingSync {
	document: DocumentId,
	engine: Arc<dyn AnalysisEngine>,
	manager: Arc<dyn FoldingManager>,
	/// Bumped on every text change; a pending recompute fires only if its
	/// captured generation is still current once the window elapses.
	generation: Arc<AtomicU64>,
	debounce: Duration,
}

impl FoldingSync {
	/// Create a synchronizer with the default debounce window.
	pub fn new(document: DocumentId, engine: Arc<dyn AnalysisEngine>, manager: Arc<dyn FoldingManager>) -> Self {
		Self {
			document,
			engine,
			manager,
			generation: Arc::new(AtomicU64::new(0)),
			debounce: FOLD_DEBOUNCE,
		}
	}

	/// Override the debounce window.
	pub fn with_debounce(mut self, debounce: Duration) -> Self {
		self.debounce = debounce;
		self
	}

	/// Note a text change, restarting the quiescence window.
	///
	/// Returns the pending recompute task; superseded tasks exit without
	/// touching the fold set.
	pub fn text_changed(&self) -> JoinHandle<()> {
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let document = self.document;
		let engine = self.engine.clone();
		let manager = self.manager.clone();
		let counter = self.generation.clone();
		let debounce = self.debounce;

		tokio::spawn(async move {
			tokio::time::sleep(debounce).await;
			if counter.load(Ordering::SeqCst) != generation {
				// Another change restarted the window.
				return;
			}

			let spans = match engine.block_structure(document).await {
				Ok(spans) => spans,
				Err(err) => {
					debug!(%document, error = %err, "fold recompute failed");
					return;
				}
			};
			if counter.load(Ordering::SeqCst) != generation {
				return;
			}

			let mut folds: Vec<FoldRegion> = spans
				.into_iter()
				.map(|block| FoldRegion {
					start: block.span.start,
					end: block.span.end(),
					name: block.banner_text,
					default_closed: false,
				})
				.collect();
			folds.sort_by_key(|fold| fold.start);

			manager.replace_all(folds, Some(0));
		})
	}

	/// The persistable fold set.
	pub fn save_foldings(&self) -> Vec<FoldRegion> {
		self.manager.snapshot()
	}

	/// Restore a previously saved fold set, replacing whatever is shown.
	pub fn restore_foldings(&self, folds: Vec<FoldRegion>) {
		self.manager.clear();
		self.manager.replace_all(folds, None);
	}
}
