//! Identity newtypes.
//!
//! Identities are opaque, globally unique within the process, and never
//! reused. They are allocated from monotonic counters, so equality is
//! identity equality and ordering reflects creation order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_id {
	($(#[$meta:meta])* $name:ident, $prefix:literal) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(u64);

		impl $name {
			/// Allocate a fresh identity, distinct from every prior one.
			pub fn fresh() -> Self {
				static NEXT: AtomicU64 = AtomicU64::new(0);
				Self(NEXT.fetch_add(1, Ordering::Relaxed))
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!($prefix, "{}"), self.0)
			}
		}
	};
}

define_id! {
	/// Identifies one open editable buffer for its whole lifetime.
	DocumentId, "doc#"
}

define_id! {
	/// Identifies one compilation unit (a submission or free-standing project).
	ProjectId, "proj#"
}

define_id! {
	/// Identifies one diagnostic record across add/remove deliveries.
	DiagnosticId, "diag#"
}
