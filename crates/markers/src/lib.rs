//! Marker overlay: an ordered set of tagged half-open text ranges.
//!
//! The overlay is the visual range-tagging layer shared by diagnostics
//! squiggles and brace highlights. It knows nothing about either consumer;
//! markers carry an opaque tag the consumer uses to find its own entries
//! again, plus a color and an optional tooltip for rendering.
//!
//! Markers are kept ordered by start offset, so iteration and overlap
//! queries walk the document front to back.

use std::collections::BTreeMap;

use replpad_primitives::Span;

/// Identifies one marker within one overlay.
///
/// Ids are never reused by the same overlay, so a stale id simply misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

/// An RGB marker color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerColor {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl MarkerColor {
	/// Low-emphasis color used for informational diagnostics.
	pub const LIME_GREEN: MarkerColor = MarkerColor { r: 50, g: 205, b: 50 };
	/// Medium-emphasis color used for warnings.
	pub const DODGER_BLUE: MarkerColor = MarkerColor { r: 30, g: 144, b: 255 };
	/// High-emphasis color used for errors.
	pub const RED: MarkerColor = MarkerColor { r: 255, g: 0, b: 0 };
	/// Color used for matching-brace highlights.
	pub const GOLDENROD: MarkerColor = MarkerColor { r: 218, g: 165, b: 32 };
}

/// One marker: a half-open range plus rendering data and an opaque tag.
#[derive(Debug, Clone)]
pub struct Marker<T> {
	/// The text range the marker covers.
	pub span: Span,
	/// Render color.
	pub color: MarkerColor,
	/// Hover tooltip, if any.
	pub tooltip: Option<String>,
	/// Consumer-defined payload used for later lookup and removal.
	pub tag: T,
}

/// An ordered collection of markers over one document.
#[derive(Debug)]
pub struct MarkerOverlay<T> {
	// Keyed by (start, id) so markers sharing a start offset stay distinct
	// and iteration is ordered by document position.
	markers: BTreeMap<(usize, MarkerId), Marker<T>>,
	next_id: u64,
}

impl<T> Default for MarkerOverlay<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> MarkerOverlay<T> {
	/// Create an empty overlay.
	pub fn new() -> Self {
		Self { markers: BTreeMap::new(), next_id: 0 }
	}

	/// Add a marker and return its id.
	pub fn create(&mut self, span: Span, color: MarkerColor, tooltip: Option<String>, tag: T) -> MarkerId {
		let id = MarkerId(self.next_id);
		self.next_id += 1;
		self.markers.insert((span.start, id), Marker { span, color, tooltip, tag });
		id
	}

	/// Remove one marker by id. Returns the marker if it was present.
	pub fn remove(&mut self, id: MarkerId) -> Option<Marker<T>> {
		let key = self.markers.keys().find(|(_, mid)| *mid == id).copied()?;
		self.markers.remove(&key)
	}

	/// Remove every marker whose tag satisfies `pred`. Returns how many were
	/// removed.
	pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
		let before = self.markers.len();
		self.markers.retain(|_, marker| !pred(&marker.tag));
		before - self.markers.len()
	}

	/// Iterate all markers in start-offset order.
	pub fn iter(&self) -> impl Iterator<Item = &Marker<T>> {
		self.markers.values()
	}

	/// Iterate markers overlapping `span`, in start-offset order.
	pub fn overlapping(&self, span: Span) -> impl Iterator<Item = &Marker<T>> {
		// Markers start strictly before the query's end; the filter drops
		// the ones that also finish before the query begins.
		self.markers
			.range(..(span.end(), MarkerId(u64::MAX)))
			.map(|(_, marker)| marker)
			.filter(move |marker| marker.span.overlaps(span))
	}

	/// The first marker starting at or after `offset`, if any.
	pub fn next_from(&self, offset: usize) -> Option<&Marker<T>> {
		self.markers.range((offset, MarkerId(0))..).map(|(_, m)| m).next()
	}

	/// The last marker starting strictly before `offset`, if any.
	pub fn prev_before(&self, offset: usize) -> Option<&Marker<T>> {
		self.markers.range(..(offset, MarkerId(0))).map(|(_, m)| m).next_back()
	}

	/// Number of markers in the overlay.
	pub fn len(&self) -> usize {
		self.markers.len()
	}

	/// Whether the overlay has no markers.
	pub fn is_empty(&self) -> bool {
		self.markers.is_empty()
	}

	/// Remove all markers.
	pub fn clear(&mut self) {
		self.markers.clear();
	}
}
