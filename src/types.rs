//! Value types shared across the crate: envelopes, grid rectangles, index
//! ranges, and configuration.

use geo::Point;
use serde::{Deserialize, Serialize};

/// A closed axis-aligned box in lon/lat coordinate space.
///
/// Envelopes are value-semantic and immutable: [`Envelope::expand`] returns a
/// new envelope rather than mutating in place. The `min_x <= max_x` and
/// `min_y <= max_y` invariants are established by the constructor.
///
/// An envelope produced by a radius buffer may carry longitudes outside
/// `[-180, 180]`; the range generator wraps those across the antimeridian.
///
/// # Examples
///
/// ```rust
/// use geocurve::{Envelope, Point};
///
/// let env = Envelope::new(-74.0, 40.7, -73.9, 40.8);
/// assert!(env.contains_point(&Point::new(-73.95, 40.75)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Envelope {
    /// Create an envelope from two opposite corners. Coordinates are
    /// reordered so the min/max invariants always hold.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// The degenerate envelope covering a single position.
    pub fn of_point(position: &Point) -> Self {
        Self::new(position.x(), position.y(), position.x(), position.y())
    }

    /// Smallest envelope enclosing both `self` and `position`.
    pub fn expand(&self, position: &Point) -> Self {
        Self {
            min_x: self.min_x.min(position.x()),
            min_y: self.min_y.min(position.y()),
            max_x: self.max_x.max(position.x()),
            max_y: self.max_y.max(position.y()),
        }
    }

    /// Get the minimum x (west) coordinate.
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Get the minimum y (south) coordinate.
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Get the maximum x (east) coordinate.
    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Get the maximum y (north) coordinate.
    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// South-west corner.
    pub fn min_point(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// North-east corner.
    pub fn max_point(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// Get the center point of the envelope.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Get the width of the envelope in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the envelope in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check whether a position lies inside (boundary inclusive).
    pub fn contains_point(&self, position: &Point) -> bool {
        position.x() >= self.min_x
            && position.x() <= self.max_x
            && position.y() >= self.min_y
            && position.y() <= self.max_y
    }

    /// Check whether this envelope intersects another.
    pub fn intersects(&self, other: &Envelope) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    /// Convert to a `geo::Rect`.
    pub fn to_rect(&self) -> geo::Rect {
        geo::Rect::new(
            geo::coord! { x: self.min_x, y: self.min_y },
            geo::coord! { x: self.max_x, y: self.max_y },
        )
    }

    /// Create an envelope from a `geo::Rect`.
    pub fn from_rect(rect: geo::Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// An axis-aligned rectangle on the `N x N` curve grid.
///
/// The origin `(x, y)` is the lower-left cell; `width` extends east and
/// `height` extends north, both counted in cells. Fields are signed because
/// rectangles projected from wrap-crossing envelopes carry a negative origin
/// or over-size bounds until the world-wrap split normalizes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    /// West edge, in cells.
    pub x: i64,
    /// South edge, in cells.
    pub y: i64,
    /// Extent in cells along x.
    pub width: i64,
    /// Extent in cells along y.
    pub height: i64,
}

impl GridRect {
    /// Create a rectangle. Extents are clamped to at least one cell.
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Number of cells covered.
    pub fn cells(&self) -> i64 {
        self.width * self.height
    }
}

/// An inclusive interval `[lo, hi]` of curve index values.
///
/// Range lists produced by decomposition are strictly ascending in `lo`,
/// non-overlapping, and non-adjacent unless compaction merged across a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    /// First index covered.
    pub lo: u64,
    /// Last index covered.
    pub hi: u64,
}

impl Range {
    /// Create a range. `lo` and `hi` are reordered if needed.
    pub fn new(lo: u64, hi: u64) -> Self {
        Self {
            lo: lo.min(hi),
            hi: lo.max(hi),
        }
    }

    /// Whether `hid` lies inside the interval.
    pub fn contains(&self, hid: u64) -> bool {
        self.lo <= hid && hid <= self.hi
    }

    /// Number of index values covered.
    pub fn len(&self) -> u64 {
        self.hi - self.lo + 1
    }
}

/// Index configuration.
///
/// Designed to be loadable from JSON or TOML with every field optional:
///
/// ```rust
/// use geocurve::Config;
///
/// let config: Config = serde_json::from_str(r#"{ "max_ranges": 64 }"#).unwrap();
/// assert_eq!(config.resolution, 19);
/// assert_eq!(config.max_ranges, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Curve order; the grid is `2^resolution` cells per side. Valid values
    /// are 1 through 30.
    #[serde(default = "Config::default_resolution")]
    pub resolution: u32,

    /// Target range count per query. Range lists longer than this are
    /// compacted by merging across the smallest gaps. Zero or negative
    /// disables compaction.
    #[serde(default = "Config::default_max_ranges")]
    pub max_ranges: i32,
}

impl Config {
    const fn default_resolution() -> u32 {
        crate::curve::DEFAULT_RESOLUTION
    }

    const fn default_max_ranges() -> i32 {
        crate::curve::DEFAULT_MAX_RANGES
    }

    /// Set the resolution, builder style.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the range-count target, builder style.
    pub fn with_max_ranges(mut self, max_ranges: i32) -> Self {
        self.max_ranges = max_ranges;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: Self::default_resolution(),
            max_ranges: Self::default_max_ranges(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_reorders_corners() {
        let env = Envelope::new(10.0, 5.0, -10.0, -5.0);
        assert_eq!(env.min_x(), -10.0);
        assert_eq!(env.max_x(), 10.0);
        assert_eq!(env.min_y(), -5.0);
        assert_eq!(env.max_y(), 5.0);
    }

    #[test]
    fn test_envelope_expand_is_value_semantic() {
        let env = Envelope::of_point(&Point::new(18.0, 57.0));
        let grown = env.expand(&Point::new(19.0, 56.0));

        assert_eq!(env.width(), 0.0);
        assert_eq!(grown.min_y(), 56.0);
        assert_eq!(grown.max_x(), 19.0);
        assert_eq!(grown.max_y(), 57.0);
    }

    #[test]
    fn test_envelope_contains_and_intersects() {
        let manhattan = Envelope::new(-74.0479, 40.6829, -73.9067, 40.8820);
        let brooklyn = Envelope::new(-74.0421, 40.5707, -73.8333, 40.7395);

        assert!(manhattan.contains_point(&Point::new(-73.9855, 40.7580)));
        assert!(!manhattan.contains_point(&Point::new(-73.9442, 40.5782)));
        assert!(manhattan.intersects(&brooklyn));
        assert!(!manhattan.intersects(&Envelope::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_envelope_rect_conversion() {
        let env = Envelope::new(-74.0, 40.7, -73.9, 40.8);
        let back = Envelope::from_rect(env.to_rect());
        assert_eq!(env, back);
    }

    #[test]
    fn test_grid_rect_clamps_extents() {
        let rect = GridRect::new(4, 4, 0, -3);
        assert_eq!(rect.width, 1);
        assert_eq!(rect.height, 1);
        assert_eq!(rect.cells(), 1);
    }

    #[test]
    fn test_range_contains_and_len() {
        let range = Range::new(10, 4);
        assert_eq!(range.lo, 4);
        assert_eq!(range.hi, 10);
        assert_eq!(range.len(), 7);
        assert!(range.contains(4));
        assert!(range.contains(10));
        assert!(!range.contains(11));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.resolution, 19);
        assert_eq!(config.max_ranges, 128);

        let config = config.with_resolution(12).with_max_ranges(-1);
        assert_eq!(config.resolution, 12);
        assert_eq!(config.max_ranges, -1);
    }
}
