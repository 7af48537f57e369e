//! Live source-text containers.

use parking_lot::RwLock;

/// Shared, mutable source text for one document.
///
/// The container is the single live authority for a document's text: the
/// editor surface writes it, and the orchestration layer reads it when it
/// needs a consistent snapshot (completion filter text, span resolution).
#[derive(Debug, Default)]
pub struct SourceContainer {
	text: RwLock<String>,
}

impl SourceContainer {
	/// Create a container holding `initial`.
	pub fn new(initial: impl Into<String>) -> Self {
		Self { text: RwLock::new(initial.into()) }
	}

	/// A snapshot of the current text.
	pub fn current_text(&self) -> String {
		self.text.read().clone()
	}

	/// Replace the text wholesale.
	pub fn set_text(&self, text: impl Into<String>) {
		*self.text.write() = text.into();
	}

	/// Current text length in bytes.
	pub fn len(&self) -> usize {
		self.text.read().len()
	}

	/// Whether the text is empty.
	pub fn is_empty(&self) -> bool {
		self.text.read().is_empty()
	}
}
