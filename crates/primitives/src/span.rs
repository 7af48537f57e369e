//! Half-open text spans.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, start + len)` within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
	/// Byte offset of the first position covered by the span.
	pub start: usize,
	/// Number of bytes covered.
	pub len: usize,
}

impl Span {
	/// Create a span from a start offset and length.
	pub fn new(start: usize, len: usize) -> Self {
		Self { start, len }
	}

	/// Create a span from half-open `[start, end)` bounds.
	///
	/// # Panics
	///
	/// Panics if `end < start`.
	pub fn from_bounds(start: usize, end: usize) -> Self {
		assert!(end >= start, "span end before start");
		Self { start, len: end - start }
	}

	/// One past the last offset covered by the span.
	pub fn end(&self) -> usize {
		self.start + self.len
	}

	/// Whether the span covers no text.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Whether `offset` falls inside the half-open range.
	pub fn contains(&self, offset: usize) -> bool {
		offset >= self.start && offset < self.end()
	}

	/// Whether this span and `other` cover at least one common offset.
	pub fn overlaps(&self, other: Span) -> bool {
		self.start < other.end() && other.start < self.end()
	}
}
