//! # Geographic Utilities
//!
//! Distance helpers for track points.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two track points |
//! | [`track_length`] | Total length of a track in meters |
//!
//! ## Example
//!
//! ```rust
//! use street_extractor::{TrackPoint, geo_utils};
//!
//! let track = vec![
//!     TrackPoint::new(0, 51.5074, -0.1278),  // London
//!     TrackPoint::new(1, 51.5080, -0.1290),
//!     TrackPoint::new(2, 51.5090, -0.1300),
//! ];
//!
//! let length = geo_utils::track_length(&track);
//! println!("Track length: {:.0}m", length);
//! ```
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).

use geo::{Distance, Haversine, Point};

use crate::TrackPoint;

/// Great-circle distance in meters between two points (spherical Earth, r = 6,371 km).
///
/// ```rust
/// use street_extractor::{TrackPoint, geo_utils};
///
/// let london = TrackPoint::new(0, 51.5074, -0.1278);
/// let paris = TrackPoint::new(1, 48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &TrackPoint, p2: &TrackPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Total length of a track in meters.
///
/// Sums the haversine distance between consecutive points, skipping segments
/// that touch an invalid coordinate. Empty or single-point tracks return 0.0.
pub fn track_length(points: &[TrackPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .filter(|w| w[0].is_valid() && w[1].is_valid())
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = TrackPoint::new(0, 51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = TrackPoint::new(0, 51.5074, -0.1278);
        let paris = TrackPoint::new(1, 48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0)); // Within 5km
    }

    #[test]
    fn test_track_length_empty() {
        assert_eq!(track_length(&[]), 0.0);
    }

    #[test]
    fn test_track_length_single_point() {
        let single = vec![TrackPoint::new(0, 51.5074, -0.1278)];
        assert_eq!(track_length(&single), 0.0);
    }

    #[test]
    fn test_track_length_two_points() {
        let track = vec![
            TrackPoint::new(0, 51.5074, -0.1278),
            TrackPoint::new(1, 51.5080, -0.1280),
        ];
        let length = track_length(&track);
        assert!(length > 0.0);
        assert!(length < 100.0); // Should be about 68m
    }

    #[test]
    fn test_track_length_skips_invalid_points() {
        let track = vec![
            TrackPoint::new(0, 51.5000, -0.1200),
            TrackPoint::new(1, f64::NAN, -0.1200),
            TrackPoint::new(2, 51.5010, -0.1200),
            TrackPoint::new(3, 51.5020, -0.1200),
        ];
        // Only the 2 -> 3 segment counts, ~111m
        assert!(approx_eq(track_length(&track), 111.2, 1.0));
    }
}
