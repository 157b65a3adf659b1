//! Visible-source specs: notation, normalization, and per-context lists.

mod positions;
mod resolve;
mod spec;
mod visible;

pub use positions::{normalize_positions, Placement, Positions};
pub use resolve::SourceResolver;
pub use spec::{Hop, RawSource, Source, SourceSpec, PSEUDO_COLUMN};
pub use visible::{ContextValue, SourceKind, VisibleSources};
