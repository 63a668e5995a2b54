//! Hilbert curve codec: point encoding and rectangle range generation.
//!
//! The codec maps positions on an `N x N` grid (`N = 2^order`) to positions
//! along a Hilbert curve and back, and decomposes grid rectangles into the
//! minimal set of curve index intervals covering them. Consecutive curve
//! indices always map to adjacent cells, which is what makes a sorted-by-hid
//! array scannable with a handful of contiguous ranges per query.

mod ranges;

pub use ranges::compact_ranges;
use ranges::{CellRect, Orientation, RangeSet, normalize_ranges, split_quad, wrap_rect};

use crate::error::{GeocurveError, Result};
use crate::geodesy::normalize_position;
use crate::projection::{LinearProjection, Projection};
use crate::types::{Config, Envelope, GridRect, Range};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Default curve order.
pub const DEFAULT_RESOLUTION: u32 = 19;

/// Default per-query range-count target.
pub const DEFAULT_MAX_RANGES: i32 = 128;

/// Highest supported curve order; `4^30` indices still fit in 64 bits.
pub const MAX_RESOLUTION: u32 = 30;

/// Outcome of a rectangle decomposition.
///
/// Besides the ranges themselves it carries the grid rectangles that were
/// actually decomposed (after world wrapping) and their lon/lat envelopes,
/// which matter for visualization and for testing coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Sorted, non-overlapping index intervals.
    pub ranges: Vec<Range>,
    /// In-world rectangles the ranges were generated from.
    pub rectangles: Vec<GridRect>,
    /// Lon/lat envelopes of those rectangles.
    pub envelopes: Vec<Envelope>,
}

impl SearchResult {
    /// Whether some range contains `hid`.
    pub fn contains(&self, hid: u64) -> bool {
        self.ranges.iter().any(|r| r.contains(hid))
    }
}

/// Encoder/decoder between grid positions and curve indices.
///
/// # Examples
///
/// ```rust
/// use geocurve::{CurveCodec, Point};
///
/// let codec = CurveCodec::new(19)?;
/// let hid = codec.encode(&Point::new(18.0, 57.0))?;
/// let cell = codec.decode(hid);
/// assert!((cell.x() - 18.0).abs() < 0.001);
/// assert!((cell.y() - 57.0).abs() < 0.001);
/// # Ok::<(), geocurve::GeocurveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CurveCodec<P: Projection = LinearProjection> {
    order: u32,
    side: u64,
    projection: P,
}

impl CurveCodec {
    /// Create a codec of the given order with the linear projection.
    pub fn new(order: u32) -> Result<Self> {
        Self::with_projection(order, LinearProjection)
    }

    /// Create a codec from a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.resolution)
    }
}

impl<P: Projection> CurveCodec<P> {
    /// Create a codec with a caller-supplied projection.
    ///
    /// # Errors
    ///
    /// [`GeocurveError::InvalidResolution`] unless `1 <= order <= 30`.
    pub fn with_projection(order: u32, projection: P) -> Result<Self> {
        if order == 0 || order > MAX_RESOLUTION {
            return Err(GeocurveError::InvalidResolution(order));
        }
        Ok(Self {
            order,
            side: 1u64 << order,
            projection,
        })
    }

    /// Curve order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Grid cells per side (`2^order`).
    pub fn side(&self) -> u64 {
        self.side
    }

    /// Total number of curve indices (`4^order`).
    pub fn curve_length(&self) -> u64 {
        self.side * self.side
    }

    /// Encode a position to its curve index.
    ///
    /// Latitude outside `[-90, 90]` is rejected; longitude is normalized
    /// modulo 360 first.
    pub fn encode(&self, position: &Point) -> Result<u64> {
        let position = normalize_position(position)?;
        let scale = self.side - 1;
        let (x, y) = self.projection.position_to_point(&position, scale);
        let x = x.clamp(0, scale as i64) as u64;
        let y = y.clamp(0, scale as i64) as u64;
        Ok(self.encode_point(x, y))
    }

    /// Decode a curve index to the position of its grid cell.
    pub fn decode(&self, hid: u64) -> Point {
        let (x, y) = self.decode_point(hid);
        self.projection
            .point_to_position(x as i64, y as i64, self.side - 1)
    }

    /// Encode a grid point to its curve index.
    ///
    /// Defined for `0 <= x, y < side()`; out-of-grid inputs silently corrupt
    /// the result, so callers clamp first.
    pub fn encode_point(&self, x: u64, y: u64) -> u64 {
        let (mut x, mut y) = (x, y);
        let mut d: u64 = 0;
        let mut s = self.side / 2;
        while s > 0 {
            let rx = u64::from(x & s > 0);
            let ry = u64::from(y & s > 0);
            d += s * s * ((3 * rx) ^ ry);

            // Rotate the remaining low bits into the child frame. The
            // wrapping subtraction may trash bits at or above `s`, which
            // later steps never read.
            if ry == 0 {
                if rx == 1 {
                    x = s.wrapping_sub(1).wrapping_sub(x);
                    y = s.wrapping_sub(1).wrapping_sub(y);
                }
                std::mem::swap(&mut x, &mut y);
            }
            s /= 2;
        }
        d
    }

    /// Decode a curve index to its grid point.
    pub fn decode_point(&self, hid: u64) -> (u64, u64) {
        let (mut x, mut y) = (0u64, 0u64);
        let mut t = hid;
        let mut s = 1u64;
        while s < self.side {
            let rx = 1 & (t / 2);
            let ry = 1 & (t ^ rx);
            if ry == 0 {
                if rx == 1 {
                    x = s - 1 - x;
                    y = s - 1 - y;
                }
                std::mem::swap(&mut x, &mut y);
            }
            x += s * rx;
            y += s * ry;
            t /= 4;
            s *= 2;
        }
        (x, y)
    }

    /// Decompose an envelope into curve index ranges.
    ///
    /// The envelope is projected onto the grid, wrapped across the
    /// antimeridian and clipped at the poles as needed, and decomposed.
    /// When `max_ranges` is positive the result is compacted down toward
    /// that count; zero or negative disables compaction.
    pub fn ranges_for(&self, envelope: &Envelope, max_ranges: i32) -> Result<SearchResult> {
        for value in [
            envelope.min_x(),
            envelope.min_y(),
            envelope.max_x(),
            envelope.max_y(),
        ] {
            if !value.is_finite() {
                log::warn!("rejecting range query for non-finite envelope {envelope:?}");
                return Err(GeocurveError::InvalidCoordinate {
                    lon: envelope.min_x(),
                    lat: envelope.min_y(),
                });
            }
        }

        let scale = self.side - 1;
        let (x0, y0) = self.projection.position_to_point(&envelope.min_point(), scale);
        let (x1, y1) = self.projection.position_to_point(&envelope.max_point(), scale);
        let rect = GridRect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1);
        self.ranges_for_rect(&rect, max_ranges)
    }

    /// Decompose a raw grid rectangle into curve index ranges.
    ///
    /// The rectangle may carry a negative origin or over-size bounds; it is
    /// reconciled with the world exactly like a projected envelope.
    pub fn ranges_for_rect(&self, rect: &GridRect, max_ranges: i32) -> Result<SearchResult> {
        let mut pieces = wrap_rect(rect, self.side as i64)?;
        pieces.sort_by_key(|piece| self.encode_point(piece.x as u64, piece.y as u64));

        let mut set = RangeSet::default();
        for piece in &pieces {
            split_quad(
                Orientation::A,
                self.side,
                0,
                CellRect::from_grid(piece),
                &mut set,
            );
        }
        let mut ranges = set.into_ranges();
        if pieces.len() > 1 {
            normalize_ranges(&mut ranges);
        }
        if max_ranges > 0 && ranges.len() > max_ranges as usize {
            compact_ranges(&mut ranges, max_ranges as usize)?;
        }

        let envelopes = pieces.iter().map(|piece| self.rect_envelope(piece)).collect();
        Ok(SearchResult {
            ranges,
            rectangles: pieces,
            envelopes,
        })
    }

    /// Decompose the square window that bounds the nearest-neighbor
    /// candidate region around `query_hid`.
    ///
    /// The window is centered on the query cell with a half-side of twice
    /// the grid distance to the neighbor cell, plus one: any item nearer
    /// than the known neighbor lies inside it, up to the lon/lat
    /// anisotropy of the projection.
    pub fn ranges_for_neighbor(
        &self,
        query_hid: u64,
        neighbor_hid: u64,
        max_ranges: i32,
    ) -> Result<SearchResult> {
        let (qx, qy) = self.decode_point(query_hid);
        let (nx, ny) = self.decode_point(neighbor_hid);

        let dx = qx as i64 - nx as i64;
        let dy = qy as i64 - ny as i64;
        let distance = ((dx * dx + dy * dy) as f64).sqrt().ceil() as i64;
        let half = 2 * distance + 1;

        let rect = GridRect::new(
            qx as i64 - half,
            qy as i64 - half,
            2 * half + 1,
            2 * half + 1,
        );
        self.ranges_for_rect(&rect, max_ranges)
    }

    /// Envelope of the decoded endpoints of every range.
    ///
    /// Cheap and endpoint-based: interior cells of a long range may stray
    /// outside it. Intended for visualization.
    ///
    /// # Errors
    ///
    /// [`GeocurveError::EmptyRanges`] when `ranges` is empty.
    pub fn bbox_for_ranges(&self, ranges: &[Range]) -> Result<Envelope> {
        let Some(first) = ranges.first() else {
            return Err(GeocurveError::EmptyRanges);
        };

        let mut envelope = Envelope::of_point(&self.decode(first.lo));
        for range in ranges {
            envelope = envelope
                .expand(&self.decode(range.lo))
                .expand(&self.decode(range.hi));
        }
        Ok(envelope)
    }

    fn rect_envelope(&self, rect: &GridRect) -> Envelope {
        let scale = self.side - 1;
        let min = self.projection.point_to_position(rect.x, rect.y, scale);
        let max = self.projection.point_to_position(
            rect.x + rect.width - 1,
            rect.y + rect.height - 1,
            scale,
        );
        Envelope::new(min.x(), min.y(), max.x(), max.y())
    }
}
