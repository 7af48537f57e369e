//! Shared editor overlay plumbing.
//!
//! Diagnostics squiggles and brace highlights share one [`MarkerOverlay`];
//! the tag tells each consumer which markers are its own to remove.

use std::sync::Arc;

use parking_lot::Mutex;
use replpad_markers::MarkerOverlay;
use replpad_primitives::DiagnosticRecord;

/// Payload attached to overlay markers.
#[derive(Debug, Clone)]
pub enum MarkerTag {
	/// A diagnostic squiggle; removal matches on the record's identity.
	Diagnostic(DiagnosticRecord),
	/// A brace highlight; the value is the brace-pair generation that
	/// produced it.
	Brace(u64),
}

/// The overlay type shared by diagnostics and brace highlighting.
pub type EditorOverlay = MarkerOverlay<MarkerTag>;

/// Handle to the overlay as shared between the editor surface and the
/// synchronizers. Mutations happen in short synchronous critical sections.
pub type SharedOverlay = Arc<Mutex<EditorOverlay>>;

/// Create an empty shared overlay.
pub fn shared_overlay() -> SharedOverlay {
	Arc::new(Mutex::new(MarkerOverlay::new()))
}
