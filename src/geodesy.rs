//! Geodesic operations on the WGS84 mean sphere.
//!
//! The index consumes geodesy through the [`Geodesy`] trait: buffering a
//! position into a lon/lat envelope, metric distance, and moving a position
//! along a bearing. [`Wgs84`] is the bundled implementation; queries accept
//! any substitute (a planar one for projected data, for instance).

use crate::error::{GeocurveError, Result};
use crate::types::Envelope;
use geo::Point;

/// Earth radius in meters for haversine distance calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Below this |cos(lat)| a longitude span is meaningless; buffers widen to
/// the full longitude range instead.
const POLAR_COS_EPSILON: f64 = 1e-10;

/// Geodesic contract consumed by the spatial index.
pub trait Geodesy {
    /// Great-circle distance between two positions, in meters.
    fn distance(&self, a: &Point, b: &Point) -> f64;

    /// The position reached by travelling `meters` from `origin` along the
    /// initial bearing `bearing_deg` (degrees clockwise from north).
    fn destination(&self, origin: &Point, bearing_deg: f64, meters: f64) -> Point;

    /// An envelope containing every position within `meters` of `center`.
    ///
    /// The envelope may over-approximate. Near a pole a coherent box cannot
    /// be represented, so the longitude span widens to the full range; this
    /// is the only accepted over-approximation beyond the box itself. The
    /// returned envelope is clipped to `[-90, 90]` latitude but its
    /// longitudes may leave `[-180, 180]` when the disc crosses the
    /// antimeridian.
    fn buffer(&self, center: &Point, meters: f64) -> Result<Envelope>;
}

/// Validate a position and bring its longitude into `[-180, 180]`.
///
/// Latitude outside `[-90, 90]` and non-finite components are rejected;
/// longitude is normalized silently, modulo 360.
pub fn normalize_position(position: &Point) -> Result<Point> {
    let (lon, lat) = (position.x(), position.y());
    if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        log::warn!("rejecting position with out-of-domain coordinates ({lon}, {lat})");
        return Err(GeocurveError::InvalidCoordinate { lon, lat });
    }
    let lon = if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    };
    Ok(Point::new(lon, lat))
}

/// Spherical geodesy on the WGS84 mean radius.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Wgs84;

impl Geodesy for Wgs84 {
    fn distance(&self, a: &Point, b: &Point) -> f64 {
        haversine_distance(a.x(), a.y(), b.x(), b.y())
    }

    fn destination(&self, origin: &Point, bearing_deg: f64, meters: f64) -> Point {
        let delta = meters / EARTH_RADIUS_METERS;
        let theta = bearing_deg.to_radians();
        let lat1 = origin.y().to_radians();
        let lon1 = origin.x().to_radians();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos())
                .atan2(delta.cos() - lat1.sin() * lat2.sin());

        let lon2_deg = (lon2.to_degrees() + 180.0).rem_euclid(360.0) - 180.0;
        Point::new(lon2_deg, lat2.to_degrees())
    }

    fn buffer(&self, center: &Point, meters: f64) -> Result<Envelope> {
        let center = normalize_position(center)?;
        let lat_delta = (meters / EARTH_RADIUS_METERS).to_degrees();

        let south = center.y() - lat_delta;
        let north = center.y() + lat_delta;
        let cos_lat = center.y().to_radians().cos();

        // A disc touching a pole covers every longitude.
        if cos_lat.abs() < POLAR_COS_EPSILON || north >= 90.0 || south <= -90.0 {
            return Ok(Envelope::new(
                -180.0,
                south.max(-90.0),
                180.0,
                north.min(90.0),
            ));
        }

        let lon_delta = lat_delta / cos_lat;
        Ok(Envelope::new(
            center.x() - lon_delta,
            south,
            center.x() + lon_delta,
            north,
        ))
    }
}

/// 2D haversine distance in meters between two lon/lat positions.
#[inline]
fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_known_pair() {
        let nyc = Point::new(-74.0060, 40.7128);
        let la = Point::new(-118.2437, 34.0522);

        let dist = Wgs84.distance(&nyc, &la);
        assert!(dist > 3_900_000.0 && dist < 4_000_000.0, "got {dist}");
        assert_eq!(dist, Wgs84.distance(&la, &nyc));
        assert_eq!(Wgs84.distance(&nyc, &nyc), 0.0);
    }

    #[test]
    fn test_distance_agrees_with_geo() {
        use geo::{Distance, Haversine};

        let a = Point::new(18.0, 57.0);
        let b = Point::new(18.5, 57.2);
        let ours = Wgs84.distance(&a, &b);
        let theirs = Haversine.distance(a, b);

        // geo uses the IUGG mean radius (6371008.8 m); ours is 6371000 m.
        assert!((ours - theirs).abs() / theirs < 1e-4);
    }

    #[test]
    fn test_destination_due_north() {
        let origin = Point::new(18.0, 57.0);
        let north = Wgs84.destination(&origin, 0.0, 1_000.0);

        let expected_lat = 57.0 + (1_000.0 / EARTH_RADIUS_METERS).to_degrees();
        assert!((north.x() - 18.0).abs() < 1e-9);
        assert!((north.y() - expected_lat).abs() < 1e-9);
    }

    #[test]
    fn test_destination_round_trip_distance() {
        let origin = Point::new(-74.0060, 40.7128);
        for bearing in [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0] {
            let dest = Wgs84.destination(&origin, bearing, 5_000.0);
            let dist = Wgs84.distance(&origin, &dest);
            assert!((dist - 5_000.0).abs() < 1.0, "bearing {bearing}: {dist}");
        }
    }

    #[test]
    fn test_buffer_contains_disc() {
        let center = Point::new(18.0, 57.0);
        let env = Wgs84.buffer(&center, 500.0).unwrap();

        for bearing in [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0] {
            let edge = Wgs84.destination(&center, bearing, 500.0);
            assert!(env.contains_point(&edge), "bearing {bearing} escaped {env:?}");
        }
    }

    #[test]
    fn test_buffer_crossing_antimeridian_keeps_raw_longitudes() {
        let env = Wgs84.buffer(&Point::new(179.9999, 0.0), 10_000.0).unwrap();
        assert!(env.max_x() > 180.0);
    }

    #[test]
    fn test_buffer_near_pole_widens_to_full_longitude() {
        let env = Wgs84.buffer(&Point::new(10.0, 89.9999), 5_000.0).unwrap();
        assert_eq!(env.min_x(), -180.0);
        assert_eq!(env.max_x(), 180.0);
        assert_eq!(env.max_y(), 90.0);
    }

    #[test]
    fn test_normalize_position() {
        let p = normalize_position(&Point::new(190.0, 10.0)).unwrap();
        assert!((p.x() - -170.0).abs() < 1e-12);
        assert_eq!(p.y(), 10.0);

        // In-range longitudes pass through untouched, 180 included.
        let p = normalize_position(&Point::new(180.0, 0.0)).unwrap();
        assert_eq!(p.x(), 180.0);

        assert!(matches!(
            normalize_position(&Point::new(0.0, 90.1)),
            Err(GeocurveError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            normalize_position(&Point::new(f64::NAN, 0.0)),
            Err(GeocurveError::InvalidCoordinate { .. })
        ));
    }
}
