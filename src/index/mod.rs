//! The indexed collection: items sorted by curve index, scanned by range.
//!
//! [`HilbertIndex`] stores items in one contiguous array ordered by their
//! curve index and answers radius and nearest-neighbor queries by turning the
//! query region into a handful of index intervals and scanning them with a
//! monotone cursor. Queries on the immutable index are thread-safe without
//! synchronization; all query state lives on the caller's stack.

mod sync;

pub use sync::SyncIndex;

use crate::curve::{CurveCodec, DEFAULT_MAX_RANGES};
use crate::error::{GeocurveError, Result};
use crate::geodesy::{Geodesy, Wgs84, normalize_position};
use crate::projection::{LinearProjection, Projection};
use crate::types::{Config, Range};
use bytes::Bytes;
use geo::Point;
use std::cmp::Ordering;

/// Read-only capabilities an indexed item exposes to the collection.
///
/// `x`/`y` are the item's true lon/lat in degrees; the curve index must be
/// the encoding of that position under the codec the collection was built
/// with. Items are owned by the collection after construction and shared
/// with callers only through query results.
pub trait CurveItem {
    /// Curve index of the item's position.
    fn hid(&self) -> u64;

    /// Longitude in degrees.
    fn x(&self) -> f64;

    /// Latitude in degrees.
    fn y(&self) -> f64;

    /// The item's position as a point.
    fn position(&self) -> Point {
        Point::new(self.x(), self.y())
    }
}

/// The bundled concrete item: a keyed position with a payload.
///
/// # Examples
///
/// ```rust
/// use geocurve::{CurveCodec, IndexedPoint, Point};
///
/// let codec = CurveCodec::new(19)?;
/// let item = IndexedPoint::new(&codec, "visby", Point::new(18.29, 57.64), "gotland")?;
/// assert_eq!(item.key, "visby");
/// # Ok::<(), geocurve::GeocurveError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    /// Curve index of `point`.
    pub hid: u64,
    /// The indexed position.
    pub point: Point,
    /// Caller-assigned identifier.
    pub key: String,
    /// Associated data payload.
    pub data: Bytes,
}

impl IndexedPoint {
    /// Create an item, encoding its curve index with `codec`.
    pub fn new<P: Projection>(
        codec: &CurveCodec<P>,
        key: impl Into<String>,
        point: Point,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        Ok(Self {
            hid: codec.encode(&point)?,
            point,
            key: key.into(),
            data: data.into(),
        })
    }
}

impl CurveItem for IndexedPoint {
    fn hid(&self) -> u64 {
        self.hid
    }

    fn x(&self) -> f64 {
        self.point.x()
    }

    fn y(&self) -> f64 {
        self.point.y()
    }
}

/// An in-memory spatial index over items sorted by curve index.
///
/// Built once from a pre-sorted sequence; the plain index never reorders or
/// mutates items afterwards, so `&HilbertIndex` queries are freely shareable
/// across threads. For in-place mutation under a reader/writer discipline,
/// wrap it in [`SyncIndex`].
///
/// # Examples
///
/// ```rust
/// use geocurve::{CurveCodec, HilbertIndex, IndexedPoint, Point};
///
/// let codec = CurveCodec::new(19)?;
/// let mut items = vec![
///     IndexedPoint::new(&codec, "1", Point::new(18.0, 57.0), "")?,
///     IndexedPoint::new(&codec, "2", Point::new(18.2, 57.0), "")?,
///     IndexedPoint::new(&codec, "3", Point::new(18.5, 57.0), "")?,
/// ];
/// items.sort_by_key(|item| item.hid);
///
/// let index = HilbertIndex::from_sorted(codec, items);
/// let hits = index.within(&Point::new(18.2001, 57.0001), 100.0)?;
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].0.key, "2");
/// # Ok::<(), geocurve::GeocurveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HilbertIndex<R, P: Projection = LinearProjection, G: Geodesy = Wgs84> {
    codec: CurveCodec<P>,
    geodesy: G,
    max_ranges: i32,
    items: Vec<R>,
}

impl<R: CurveItem, P: Projection> HilbertIndex<R, P> {
    /// Build an index over items pre-sorted ascending by curve index.
    ///
    /// The order is trusted, not validated: with very large collections the
    /// sort dominates build cost and the feeder already produces sorted
    /// output. Use [`HilbertIndex::try_from_sorted`] to pay for the check.
    pub fn from_sorted(codec: CurveCodec<P>, items: impl IntoIterator<Item = R>) -> Self {
        Self::with_geodesy(codec, Wgs84, items)
    }
}

impl<R: CurveItem> HilbertIndex<R> {
    /// Build an index using the settings in `config`.
    pub fn from_config(config: &Config, items: impl IntoIterator<Item = R>) -> Result<Self> {
        Ok(Self::from_sorted(CurveCodec::from_config(config)?, items)
            .with_max_ranges(config.max_ranges))
    }
}

impl<R: CurveItem, P: Projection, G: Geodesy> HilbertIndex<R, P, G> {
    /// Build an index with a caller-supplied geodesy.
    pub fn with_geodesy(
        codec: CurveCodec<P>,
        geodesy: G,
        items: impl IntoIterator<Item = R>,
    ) -> Self {
        let items: Vec<R> = items.into_iter().collect();
        debug_assert!(
            items.windows(2).all(|w| w[0].hid() <= w[1].hid()),
            "items must be pre-sorted ascending by curve index"
        );
        log::debug!("indexed {} items at order {}", items.len(), codec.order());
        Self {
            codec,
            geodesy,
            max_ranges: DEFAULT_MAX_RANGES,
            items,
        }
    }

    /// Like [`HilbertIndex::from_sorted`], but verifies the order.
    ///
    /// # Errors
    ///
    /// [`GeocurveError::InputNotSorted`] when any item's curve index is
    /// smaller than its predecessor's.
    pub fn try_from_sorted(
        codec: CurveCodec<P>,
        geodesy: G,
        items: impl IntoIterator<Item = R>,
    ) -> Result<Self> {
        let items: Vec<R> = items.into_iter().collect();
        if items.windows(2).any(|w| w[0].hid() > w[1].hid()) {
            return Err(GeocurveError::InputNotSorted);
        }
        Ok(Self::with_geodesy(codec, geodesy, items))
    }

    /// Set the per-query range-count target, builder style.
    pub fn with_max_ranges(mut self, max_ranges: i32) -> Self {
        self.max_ranges = max_ranges;
        self
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items, ascending by curve index.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// The codec the index was built with.
    pub fn codec(&self) -> &CurveCodec<P> {
        &self.codec
    }

    /// Find all items within `meters` of `center`, ascending by distance.
    ///
    /// An empty result is not an error; it just means nothing was close.
    pub fn within(&self, center: &Point, meters: f64) -> Result<Vec<(R, f64)>>
    where
        R: Clone,
    {
        let center = normalize_position(center)?;
        let candidates = self.candidates_within(&center, meters)?;
        Ok(rank_by_distance(
            &self.geodesy,
            &center,
            candidates,
            Some(meters),
        ))
    }

    /// Find the items around the nearest neighbor of `center`, ascending by
    /// distance; the first element is the metric nearest item.
    ///
    /// Empty only when the index is empty.
    pub fn nearest(&self, center: &Point) -> Result<Vec<(R, f64)>>
    where
        R: Clone,
    {
        let center = normalize_position(center)?;
        match self.candidates_nearest(&center)? {
            Some(candidates) => Ok(rank_by_distance(&self.geodesy, &center, candidates, None)),
            None => Ok(Vec::new()),
        }
    }

    /// Count items within `meters` of `center` without materializing them.
    pub fn count_within(&self, center: &Point, meters: f64) -> Result<usize> {
        let center = normalize_position(center)?;
        Ok(self
            .scan_buffer(&center, meters)?
            .into_iter()
            .filter(|item| self.geodesy.distance(&item.position(), &center) <= meters)
            .count())
    }

    /// Whether any item lies within `meters` of `center`.
    pub fn contains_within(&self, center: &Point, meters: f64) -> Result<bool> {
        let center = normalize_position(center)?;
        Ok(self
            .scan_buffer(&center, meters)?
            .into_iter()
            .any(|item| self.geodesy.distance(&item.position(), &center) <= meters))
    }

    /// Insert one item at its sorted position. Appends after an existing run
    /// of equal curve indices.
    pub fn insert(&mut self, item: R) {
        let at = self.items.partition_point(|it| it.hid() <= item.hid());
        self.items.insert(at, item);
    }

    /// Remove one item equal to `item`. Returns whether anything was removed.
    pub fn remove(&mut self, item: &R) -> bool
    where
        R: PartialEq,
    {
        let mut at = self.items.partition_point(|it| it.hid() < item.hid());
        while at < self.items.len() && self.items[at].hid() == item.hid() {
            if self.items[at] == *item {
                self.items.remove(at);
                return true;
            }
            at += 1;
        }
        false
    }

    /// Candidate-extraction phase of [`HilbertIndex::within`]: every item
    /// whose curve index falls in the buffered query region, unfiltered.
    ///
    /// `center` must already be normalized.
    pub(crate) fn candidates_within(&self, center: &Point, meters: f64) -> Result<Vec<R>>
    where
        R: Clone,
    {
        Ok(self
            .scan_buffer(center, meters)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Candidate-extraction phase of [`HilbertIndex::nearest`]. `None` when
    /// the index is empty.
    pub(crate) fn candidates_nearest(&self, center: &Point) -> Result<Option<Vec<R>>>
    where
        R: Clone,
    {
        if self.items.is_empty() {
            return Ok(None);
        }
        let query = self.codec.encode(center)?;
        let pivot = self.pivot_hid(query);
        let search = self
            .codec
            .ranges_for_neighbor(query, pivot, self.max_ranges)?;
        Ok(Some(
            self.collect_in_ranges(&search.ranges)
                .into_iter()
                .cloned()
                .collect(),
        ))
    }

    fn scan_buffer(&self, center: &Point, meters: f64) -> Result<Vec<&R>> {
        let envelope = self.geodesy.buffer(center, meters)?;
        let search = self.codec.ranges_for(&envelope, self.max_ranges)?;
        Ok(self.collect_in_ranges(&search.ranges))
    }

    /// Scan the sorted item array over a sorted, disjoint range list.
    ///
    /// The cursor never rewinds across ranges: each lower-bound search
    /// starts where the previous range left off, so the whole scan costs one
    /// binary search per range amortized over the already-consumed prefix,
    /// plus the hits. The lower-bound search lands on the first item of a
    /// run of equal curve indices, so duplicates are always yielded in full.
    fn collect_in_ranges(&self, ranges: &[Range]) -> Vec<&R> {
        let mut hits = Vec::new();
        let mut cursor = 0usize;
        for range in ranges {
            cursor += self.items[cursor..].partition_point(|item| item.hid() < range.lo);
            while cursor < self.items.len() && self.items[cursor].hid() <= range.hi {
                hits.push(&self.items[cursor]);
                cursor += 1;
            }
        }
        hits
    }

    /// The curve index in the collection closest to `query`, favoring the
    /// larger value on a tie.
    fn pivot_hid(&self, query: u64) -> u64 {
        match self
            .items
            .binary_search_by(|item| item.hid().cmp(&query))
        {
            Ok(at) => self.items[at].hid(),
            Err(insertion) if insertion == self.items.len() => {
                self.items[self.items.len() - 1].hid()
            }
            Err(0) => self.items[0].hid(),
            Err(insertion) => {
                let before = self.items[insertion - 1].hid();
                let after = self.items[insertion].hid();
                if query - before < after - query {
                    before
                } else {
                    after
                }
            }
        }
    }
}

/// Attach metric distances, drop anything beyond `radius`, and order
/// ascending by distance. Runs on the caller's snapshot, outside any lock.
pub(crate) fn rank_by_distance<R: CurveItem, G: Geodesy>(
    geodesy: &G,
    center: &Point,
    candidates: Vec<R>,
    radius: Option<f64>,
) -> Vec<(R, f64)> {
    let mut hits: Vec<(R, f64)> = candidates
        .into_iter()
        .map(|item| {
            let distance = geodesy.distance(&item.position(), center);
            (item, distance)
        })
        .filter(|(_, distance)| radius.is_none_or(|r| *distance <= r))
        .collect();
    hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    hits
}
