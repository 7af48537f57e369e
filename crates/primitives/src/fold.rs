//! The persisted fold-region record.

use serde::{Deserialize, Serialize};

/// One foldable region, as shown by the folding manager and as persisted
/// across sessions.
///
/// The persisted format is an ordered sequence of these records with no
/// other required structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRegion {
	/// Offset where the fold starts.
	pub start: usize,
	/// Offset one past where the fold ends.
	pub end: usize,
	/// Banner text shown while the region is collapsed.
	pub name: String,
	/// Whether the region starts out collapsed when restored.
	#[serde(default)]
	pub default_closed: bool,
}
