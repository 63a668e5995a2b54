//! Projection between lon/lat positions and integer grid coordinates.

use geo::Point;

/// Maps positions onto an integer grid and back.
///
/// This is a hot-path contract: it runs once per query point and once per
/// rectangle corner, so implementations must be pure and allocation-free.
/// The `scale` argument is the largest grid coordinate (callers pass
/// `side - 1` so that the coordinate-space endpoints land on the grid
/// maximum).
///
/// The forward direction performs no bounds checking beyond float-to-int
/// truncation; positions outside the coordinate domain yield out-of-grid
/// points, which the range generator reconciles by wrapping. The inverse
/// clamps into the grid first.
pub trait Projection {
    /// Project a position to grid coordinates.
    fn position_to_point(&self, position: &Point, scale: u64) -> (i64, i64);

    /// Project grid coordinates back to a position, clamping to `[0, scale]`.
    fn point_to_position(&self, x: i64, y: i64, scale: u64) -> Point;
}

/// The default equirectangular projection: longitude maps linearly over the
/// x axis, latitude over the y axis, with the south-west corner at (0, 0).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinearProjection;

impl Projection for LinearProjection {
    #[inline]
    fn position_to_point(&self, position: &Point, scale: u64) -> (i64, i64) {
        let scale = scale as f64;
        let x = ((180.0 + position.x()) * scale / 360.0).trunc() as i64;
        let y = ((90.0 + position.y()) * scale / 180.0).trunc() as i64;
        (x, y)
    }

    #[inline]
    fn point_to_position(&self, x: i64, y: i64, scale: u64) -> Point {
        let x = x.clamp(0, scale as i64) as f64;
        let y = y.clamp(0, scale as i64) as f64;
        let scale = scale as f64;
        Point::new(x * 360.0 / scale - 180.0, y * 180.0 / scale - 90.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: u64 = (1 << 19) - 1;

    #[test]
    fn test_endpoints_map_to_grid_extremes() {
        let projection = LinearProjection;

        assert_eq!(
            projection.position_to_point(&Point::new(-180.0, -90.0), SCALE),
            (0, 0)
        );
        assert_eq!(
            projection.position_to_point(&Point::new(180.0, 90.0), SCALE),
            (SCALE as i64, SCALE as i64)
        );
    }

    #[test]
    fn test_out_of_domain_positions_leave_the_grid() {
        let projection = LinearProjection;

        let (x, _) = projection.position_to_point(&Point::new(-180.7, 0.0), SCALE);
        assert!(x < 0);

        let (x, _) = projection.position_to_point(&Point::new(181.0, 0.0), SCALE);
        assert!(x > SCALE as i64);
    }

    #[test]
    fn test_inverse_clamps_to_grid() {
        let projection = LinearProjection;

        let position = projection.point_to_position(-40, 9_999_999_999, SCALE);
        assert_eq!(position.x(), -180.0);
        assert_eq!(position.y(), 90.0);
    }

    #[test]
    fn test_round_trip_stays_within_a_cell() {
        let projection = LinearProjection;
        let cell_lon = 360.0 / SCALE as f64;
        let cell_lat = 180.0 / SCALE as f64;

        for &(lon, lat) in &[(18.0, 57.0), (-74.0060, 40.7128), (139.65, -35.0), (0.0, 0.0)] {
            let (x, y) = projection.position_to_point(&Point::new(lon, lat), SCALE);
            let back = projection.point_to_position(x, y, SCALE);
            assert!((back.x() - lon).abs() <= cell_lon, "lon drifted at ({lon}, {lat})");
            assert!((back.y() - lat).abs() <= cell_lat, "lat drifted at ({lon}, {lat})");
        }
    }
}
