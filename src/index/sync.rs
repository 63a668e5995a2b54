//! Thread-safe wrapper for a mutable index.
//!
//! `SyncIndex` shares one [`HilbertIndex`] behind `Arc<RwLock<..>>`: many
//! concurrent readers or one writer, never both. A query holds the read
//! lease only for its candidate-extraction phase (the binary search and walk
//! must see a consistent ordered array); distance filtering and sorting run
//! on the caller's snapshot after the lease is released. Writers hold the
//! lock for the duration of one placement or removal.
//!
//! # Examples
//!
//! ```rust
//! use geocurve::{CurveCodec, IndexedPoint, HilbertIndex, Point, SyncIndex};
//! use std::thread;
//!
//! # fn main() -> Result<(), geocurve::GeocurveError> {
//! let codec = CurveCodec::new(19)?;
//! let index = SyncIndex::new(HilbertIndex::from_sorted(codec.clone(), Vec::new()));
//!
//! let writer = index.clone();
//! let visby = IndexedPoint::new(&codec, "visby", Point::new(18.29, 57.64), "")?;
//! let handle = thread::spawn(move || {
//!     writer.insert(visby);
//! });
//! handle.join().unwrap();
//!
//! let hits = index.nearest(&Point::new(18.3, 57.6))?;
//! assert_eq!(hits[0].0.key, "visby");
//! # Ok(())
//! # }
//! ```

use super::{CurveItem, HilbertIndex, rank_by_distance};
use crate::error::Result;
use crate::geodesy::{Geodesy, Wgs84, normalize_position};
use crate::projection::{LinearProjection, Projection};
use geo::Point;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe reader/writer wrapper around [`HilbertIndex`].
///
/// Cloning is cheap and shares the underlying index.
#[derive(Debug)]
pub struct SyncIndex<R, P: Projection = LinearProjection, G: Geodesy = Wgs84> {
    inner: Arc<RwLock<HilbertIndex<R, P, G>>>,
    geodesy: G,
}

impl<R, P: Projection, G: Geodesy + Clone> Clone for SyncIndex<R, P, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            geodesy: self.geodesy.clone(),
        }
    }
}

impl<R: CurveItem + Clone, P: Projection, G: Geodesy + Clone> SyncIndex<R, P, G> {
    /// Wrap an index for shared mutable access.
    pub fn new(index: HilbertIndex<R, P, G>) -> Self {
        Self {
            geodesy: index.geodesy.clone(),
            inner: Arc::new(RwLock::new(index)),
        }
    }

    /// Find all items within `meters` of `center`, ascending by distance.
    ///
    /// Takes the read lock for candidate extraction only.
    pub fn within(&self, center: &Point, meters: f64) -> Result<Vec<(R, f64)>> {
        let center = normalize_position(center)?;
        let candidates = self.inner.read().candidates_within(&center, meters)?;
        Ok(rank_by_distance(
            &self.geodesy,
            &center,
            candidates,
            Some(meters),
        ))
    }

    /// Find the items around the nearest neighbor of `center`, ascending by
    /// distance. Empty only when the index is empty.
    pub fn nearest(&self, center: &Point) -> Result<Vec<(R, f64)>> {
        let center = normalize_position(center)?;
        let candidates = self.inner.read().candidates_nearest(&center)?;
        match candidates {
            Some(candidates) => Ok(rank_by_distance(&self.geodesy, &center, candidates, None)),
            None => Ok(Vec::new()),
        }
    }

    /// Insert one item at its sorted position.
    pub fn insert(&self, item: R) {
        self.inner.write().insert(item);
    }

    /// Remove one item equal to `item`. Returns whether anything was removed.
    pub fn remove(&self, item: &R) -> bool
    where
        R: PartialEq,
    {
        self.inner.write().remove(item)
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
