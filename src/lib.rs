//! In-memory Hilbert-curve spatial index for geographic points.
//!
//! Items are stored in one array sorted by their position along a Hilbert
//! curve; a query turns its lon/lat region into a short sorted list of curve
//! index intervals and scans them with a monotone cursor, so radius and
//! nearest-neighbor searches cost a few binary searches plus the hits.
//!
//! ```rust
//! use geocurve::{CurveCodec, HilbertIndex, IndexedPoint, Point};
//!
//! let codec = CurveCodec::new(19)?;
//! let mut cities = vec![
//!     IndexedPoint::new(&codec, "visby", Point::new(18.29, 57.64), "SE")?,
//!     IndexedPoint::new(&codec, "stockholm", Point::new(18.07, 59.33), "SE")?,
//!     IndexedPoint::new(&codec, "gothenburg", Point::new(11.97, 57.71), "SE")?,
//! ];
//! cities.sort_by_key(|city| city.hid);
//!
//! let index = HilbertIndex::from_sorted(codec, cities);
//!
//! let nearby = index.within(&Point::new(18.0, 59.3), 10_000.0)?;
//! assert_eq!(nearby[0].0.key, "stockholm");
//!
//! let nearest = index.nearest(&Point::new(18.3, 57.6))?;
//! assert_eq!(nearest[0].0.key, "visby");
//! # Ok::<(), geocurve::GeocurveError>(())
//! ```
//!
//! The index is exact with respect to the grid quantization and the supplied
//! distance function: candidate extraction over-approximates (compaction may
//! merge ranges across gaps) and the final metric filter removes the false
//! positives. Nothing is persisted; the index lives for the process.

pub mod curve;
pub mod error;
pub mod geodesy;
pub mod index;
pub mod projection;
pub mod types;

pub use curve::{
    CurveCodec, DEFAULT_MAX_RANGES, DEFAULT_RESOLUTION, MAX_RESOLUTION, SearchResult,
    compact_ranges,
};
pub use error::{GeocurveError, Result};
pub use geodesy::{EARTH_RADIUS_METERS, Geodesy, Wgs84, normalize_position};
pub use index::{CurveItem, HilbertIndex, IndexedPoint, SyncIndex};
pub use projection::{LinearProjection, Projection};
pub use types::{Config, Envelope, GridRect, Range};

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CurveCodec, HilbertIndex, IndexedPoint, SyncIndex};

    pub use crate::{GeocurveError, Result};

    pub use crate::{Config, Envelope, Point, Range};

    pub use crate::{Geodesy, Wgs84};
}
