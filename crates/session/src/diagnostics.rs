//! Diagnostics-to-overlay synchronization.
//!
//! A subscription consumes one workspace's diagnostic-change feed and
//! reconciles each batch onto the marker overlay: markers whose record
//! appears in the removed set go away, non-hidden unsuppressed added
//! records gain a marker tagged with the record itself.
//!
//! Events are applied in arrival order, with no reordering or coalescing
//! beyond what the feed itself coalesced. The feed is expected not to
//! re-add an unchanged record without removing it first; adds are not
//! deduplicated here.
//!
//! Unsubscribing while an event is mid-flight is safe: in-flight events for
//! an unsubscribed document are dropped on the floor.

use std::sync::Arc;

use replpad_markers::MarkerColor;
use replpad_primitives::{DiagnosticsChanged, DocumentId, Severity};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::overlay::{MarkerTag, SharedOverlay};
use crate::source::SourceContainer;
use crate::{Error, Result};

/// A live diagnostics subscription for one document.
///
/// Dropping the handle cancels the subscription.
#[derive(Debug)]
pub struct DiagnosticsSubscription {
	cancel: CancellationToken,
	task: Option<JoinHandle<()>>,
}

impl DiagnosticsSubscription {
	/// Stop consuming events and wait for the applying task to exit.
	pub async fn unsubscribe(mut self) {
		self.cancel.cancel();
		if let Some(task) = self.task.take() {
			let _ = task.await;
		}
	}
}

impl Drop for DiagnosticsSubscription {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

/// Subscribe `document` to a workspace diagnostics feed, reconciling every
/// batch onto `overlay`.
///
/// The feed carries events for every document in the workspace; batches for
/// other documents are ignored.
pub fn subscribe(
	document: DocumentId,
	mut feed: broadcast::Receiver<DiagnosticsChanged>,
	overlay: SharedOverlay,
	source: Arc<SourceContainer>,
) -> DiagnosticsSubscription {
	let cancel = CancellationToken::new();
	let task = tokio::spawn({
		let cancel = cancel.clone();
		async move {
			loop {
				let event = tokio::select! {
					_ = cancel.cancelled() => break,
					event = feed.recv() => event,
				};
				match event {
					Ok(event) => {
						if event.document != document {
							continue;
						}
						apply_event(&overlay, &source, &event);
					}
					Err(broadcast::error::RecvError::Lagged(skipped)) => {
						warn!(%document, skipped, "diagnostics feed lagged");
					}
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
		}
	});
	DiagnosticsSubscription { cancel, task: Some(task) }
}

/// Reconcile one batch onto the overlay.
///
/// Removals run first so a record superseded within the batch never
/// survives it. Added records with no resolvable span are skipped silently.
pub(crate) fn apply_event(overlay: &SharedOverlay, source: &SourceContainer, event: &DiagnosticsChanged) {
	let mut overlay = overlay.lock();

	if !event.removed.is_empty() {
		overlay.remove_where(|tag| match tag {
			MarkerTag::Diagnostic(record) => event.removed.iter().any(|removed| removed.id == record.id),
			MarkerTag::Brace(_) => false,
		});
	}

	let text_len = source.len();
	for record in &event.added {
		if record.severity == Severity::Hidden || record.suppressed {
			continue;
		}
		let Some(span) = record.span.filter(|span| span.end() <= text_len) else {
			continue;
		};
		let color = match severity_color(record.severity) {
			Ok(color) => color,
			Err(err) => {
				debug_assert!(false, "{err}");
				error!(document = %record.document, error = %err, "dropping diagnostic with unrenderable severity");
				continue;
			}
		};
		overlay.create(span, color, Some(record.message.clone()), MarkerTag::Diagnostic(record.clone()));
	}
}

/// Marker color for a renderable severity.
///
/// # Errors
///
/// [`Error::InvalidState`]: hidden severities must be filtered out before
/// rendering; reaching this mapping with one is a contract breach.
pub(crate) fn severity_color(severity: Severity) -> Result<MarkerColor> {
	match severity {
		Severity::Info => Ok(MarkerColor::LIME_GREEN),
		Severity::Warning => Ok(MarkerColor::DODGER_BLUE),
		Severity::Error => Ok(MarkerColor::RED),
		Severity::Hidden => Err(Error::InvalidState("hidden diagnostics are never rendered".into())),
	}
}
