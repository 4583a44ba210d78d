//! # Street Extractor
//!
//! Turn a GPS track into the ordered list of streets actually travelled.
//!
//! This library provides:
//! - Down-sampling of track points before reverse geocoding
//! - A debouncing state machine that suppresses geocoder noise near intersections
//! - Pluggable resolvers, including an optional Nominatim HTTP client
//! - Parallel batch extraction across many tracks
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch extraction with rayon
//! - **`http`** - Enable the Nominatim reverse-geocoding resolver
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use street_extractor::{extract_streets, ExtractConfig, Street, TrackPoint};
//!
//! // Walking north: the geocoder reports Bridge Road up to 51.501, then Station Road
//! let track: Vec<TrackPoint> = (0..40)
//!     .map(|i| TrackPoint::new(i, 51.5 + i as f64 * 0.00005, -0.12))
//!     .collect();
//!
//! let resolver = |lat: f64, _lon: f64| {
//!     if lat < 51.501 { Street::named("Bridge Road") } else { Street::named("Station Road") }
//! };
//!
//! let streets = extract_streets(&track, &resolver, &ExtractConfig::default()).unwrap();
//! assert_eq!(streets, vec!["Bridge Road", "Station Road"]);
//! ```

use log::{debug, info};

pub mod error;
pub use error::{ExtractError, Result};

pub mod geo_utils;

pub mod sampler;
pub use sampler::{sample, sampled_count, Sampler};

pub mod debouncer;
pub use debouncer::{DebounceState, Debouncer};

pub mod resolver;
pub use resolver::{ScriptedResolver, StaticResolver, StreetResolver};

// HTTP module for reverse geocoding
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{NominatimConfig, NominatimResolver};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("StreetExtractorRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A point of the input track.
///
/// `index` is the point's position in the original track and must strictly
/// increase along the track. `time` is an optional timestamp in seconds
/// (any epoch); only differences between timestamps are used.
///
/// # Example
/// ```
/// use street_extractor::TrackPoint;
/// let point = TrackPoint::new(0, 51.5074, -0.1278).with_time(Some(1_700_000_000.0));
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackPoint {
    pub index: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub time: Option<f64>,
}

impl TrackPoint {
    /// Create a new untimed track point.
    pub fn new(index: u32, latitude: f64, longitude: f64) -> Self {
        Self { index, latitude, longitude, time: None }
    }

    pub fn with_time(mut self, time: Option<f64>) -> Self {
        self.time = time;
        self
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Result of reverse-geocoding one point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Street {
    Named(String),
    /// No usable geocode result. Treated as a gap, never as a competing street.
    Unknown,
}

impl Street {
    /// A named street. Blank names become [`Street::Unknown`].
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_option(Some(name.into()))
    }

    /// Convert an optional geocoder answer, mapping `None` and blank names to UNKNOWN.
    pub fn from_option(name: Option<String>) -> Self {
        match name {
            Some(n) if !n.trim().is_empty() => Street::Named(n),
            _ => Street::Unknown,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Street::Named(n) => Some(n.as_str()),
            Street::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Street::Unknown)
    }
}

impl std::fmt::Display for Street {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Street::Named(n) => f.write_str(n),
            Street::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// A sampled point together with the street it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    pub index: u32,
    pub street: Street,
    pub time: Option<f64>,
}

impl ResolvedPoint {
    pub fn new(index: u32, street: Street) -> Self {
        Self { index, street, time: None }
    }

    pub fn with_time(mut self, time: Option<f64>) -> Self {
        self.time = time;
        self
    }
}

/// A street accepted into the output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ConfirmedStreet {
    /// Street name as returned by the resolver
    pub name: String,
    /// Track index of the first consecutive hit of the confirming run
    pub first_index: u32,
    /// Timestamp of that first hit, if the track was timed
    pub first_time: Option<f64>,
    /// Consecutive hits the run had when it was confirmed
    pub hits: u32,
    /// True if confirmed by the relaxed end-of-track threshold
    pub via_final: bool,
}

impl ConfirmedStreet {
    /// Seconds between `start` and this street's first hit.
    ///
    /// Returns 0.0 when either timestamp is missing.
    pub fn offset_from(&self, start: Option<f64>) -> f64 {
        match (start, self.first_time) {
            (Some(start), Some(t)) => t - start,
            _ => 0.0,
        }
    }
}

/// Configuration for street extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ExtractConfig {
    /// Resolve one point out of every `downsample` (plus the last point).
    /// Must be >= 1. Default: 5
    pub downsample: u32,

    /// Consecutive hits required to accept a change of street.
    /// Must be >= 1. Default: 3
    pub threshold: u32,

    /// Relaxed hit count that confirms a street still pending when the track ends.
    /// Must satisfy 1 <= final_threshold <= threshold. Default: 2
    pub final_threshold: u32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            downsample: 5,
            threshold: 3,
            final_threshold: 2,
        }
    }
}

impl ExtractConfig {
    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.downsample < 1 {
            return Err(ExtractError::Configuration(format!(
                "downsample must be >= 1 (got {})",
                self.downsample
            )));
        }
        if self.threshold < 1 {
            return Err(ExtractError::Configuration(format!(
                "threshold must be >= 1 (got {})",
                self.threshold
            )));
        }
        if self.final_threshold < 1 || self.final_threshold > self.threshold {
            return Err(ExtractError::Configuration(format!(
                "final_threshold must be between 1 and threshold ({}) (got {})",
                self.threshold, self.final_threshold
            )));
        }
        Ok(())
    }
}

/// A track with an identifier, for batch extraction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct StreetTrack {
    pub track_id: String,
    pub points: Vec<TrackPoint>,
}

/// Outcome of extracting one track of a batch.
#[derive(Debug, Clone)]
pub struct TrackStreets {
    pub track_id: String,
    pub streets: Result<Vec<ConfirmedStreet>>,
}

// ============================================================================
// Core Functions
// ============================================================================

/// Extract the confirmed streets of a track.
///
/// Validates the configuration and the point order before the first resolver
/// call, so an invalid run costs no geocoding requests and yields no partial
/// output.
pub fn extract_confirmed_streets<R>(
    points: &[TrackPoint],
    resolver: &R,
    config: &ExtractConfig,
) -> Result<Vec<ConfirmedStreet>>
where
    R: StreetResolver + ?Sized,
{
    config.validate()?;
    check_order(points)?;

    let mut debouncer = Debouncer::new(config)?;
    let planned = sampled_count(points.len(), config.downsample)?;

    debug!(
        "[StreetExtractor] track: {} points, {:.0}m, resolving {} (downsample {})",
        points.len(),
        geo_utils::track_length(points),
        planned,
        config.downsample
    );

    let start = std::time::Instant::now();
    let mut unknown = 0usize;

    for point in sample(points, config.downsample)? {
        let street = resolver.resolve(point.latitude, point.longitude);
        debug!(
            "[StreetExtractor] #{} lat={:.6} lon={:.6} street={}",
            point.index, point.latitude, point.longitude, street
        );
        if street.is_unknown() {
            unknown += 1;
        }

        let resolved = ResolvedPoint::new(point.index, street).with_time(point.time);
        debouncer.process(&resolved)?;
    }

    let confirmed = debouncer.finalize();

    info!(
        "[StreetExtractor] {} street(s) from {} lookups ({} unknown) in {:?}",
        confirmed.len(),
        planned,
        unknown,
        start.elapsed()
    );

    Ok(confirmed)
}

/// Extract the names of the confirmed streets of a track.
pub fn extract_streets<R>(
    points: &[TrackPoint],
    resolver: &R,
    config: &ExtractConfig,
) -> Result<Vec<String>>
where
    R: StreetResolver + ?Sized,
{
    let confirmed = extract_confirmed_streets(points, resolver, config)?;
    Ok(confirmed.into_iter().map(|c| c.name).collect())
}

/// Extract streets for many tracks, one after another.
///
/// Each track is an independent run: a failing track does not affect the others.
pub fn extract_streets_batch<R>(
    tracks: &[StreetTrack],
    resolver: &R,
    config: &ExtractConfig,
) -> Vec<TrackStreets>
where
    R: StreetResolver + ?Sized,
{
    tracks
        .iter()
        .map(|track| TrackStreets {
            track_id: track.track_id.clone(),
            streets: extract_confirmed_streets(&track.points, resolver, config),
        })
        .collect()
}

/// Extract streets for many tracks using parallel processing.
///
/// Same as [`extract_streets_batch`] but runs tracks concurrently with rayon.
/// Results keep the input order. The resolver is shared across threads, so any
/// pacing it does applies to all tracks together.
#[cfg(feature = "parallel")]
pub fn extract_streets_batch_parallel<R>(
    tracks: &[StreetTrack],
    resolver: &R,
    config: &ExtractConfig,
) -> Vec<TrackStreets>
where
    R: StreetResolver + Sync + ?Sized,
{
    use rayon::prelude::*;

    tracks
        .par_iter()
        .map(|track| TrackStreets {
            track_id: track.track_id.clone(),
            streets: extract_confirmed_streets(&track.points, resolver, config),
        })
        .collect()
}

/// Timestamp of the first timed point, used as the zero for offsets.
pub fn track_start_time(points: &[TrackPoint]) -> Option<f64> {
    points.iter().find_map(|p| p.time)
}

/// Format an elapsed offset in seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours; negative offsets clamp to zero.
///
/// # Example
/// ```
/// use street_extractor::format_offset;
/// assert_eq!(format_offset(75.9), "01:15");
/// assert_eq!(format_offset(3725.0), "62:05");
/// ```
pub fn format_offset(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn check_order(points: &[TrackPoint]) -> Result<()> {
    for w in points.windows(2) {
        if w[1].index <= w[0].index {
            return Err(ExtractError::SequenceOrder {
                previous: w[0].index,
                current: w[1].index,
            });
        }
    }
    Ok(())
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::info;

    /// Callback interface for reverse geocoding on the host side.
    /// Implement this in Kotlin/Swift; return `None` for no result or on failure.
    #[uniffi::export(callback_interface)]
    pub trait FfiStreetResolver: Send + Sync {
        fn resolve_street(&self, latitude: f64, longitude: f64) -> Option<String>;
    }

    struct ForeignResolver(Box<dyn FfiStreetResolver>);

    impl StreetResolver for ForeignResolver {
        fn resolve(&self, latitude: f64, longitude: f64) -> Street {
            Street::from_option(self.0.resolve_street(latitude, longitude))
        }
    }

    /// Result of an extraction run. `error` is set and `streets` empty on failure.
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiExtractResult {
        pub streets: Vec<ConfirmedStreet>,
        pub error: Option<String>,
    }

    /// Extract confirmed streets from a track using a host-provided resolver.
    #[uniffi::export]
    pub fn ffi_extract_streets(
        points: Vec<TrackPoint>,
        config: ExtractConfig,
        resolver: Box<dyn FfiStreetResolver>,
    ) -> FfiExtractResult {
        init_logging();
        info!("[StreetExtractorRust] extract_streets called with {} points", points.len());

        let resolver = ForeignResolver(resolver);
        match extract_confirmed_streets(&points, &resolver, &config) {
            Ok(streets) => FfiExtractResult { streets, error: None },
            Err(e) => FfiExtractResult {
                streets: vec![],
                error: Some(e.to_string()),
            },
        }
    }

    /// Get default extraction configuration
    #[uniffi::export]
    pub fn default_extract_config() -> ExtractConfig {
        ExtractConfig::default()
    }

    /// Format an elapsed offset as MM:SS.
    #[uniffi::export]
    pub fn ffi_format_offset(seconds: f64) -> String {
        format_offset(seconds)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn straight_track(len: u32) -> Vec<TrackPoint> {
        (0..len)
            .map(|i| TrackPoint::new(i, 51.5 + i as f64 * 0.0001, -0.1278).with_time(Some(1000.0 + i as f64 * 5.0)))
            .collect()
    }

    fn config(downsample: u32, threshold: u32, final_threshold: u32) -> ExtractConfig {
        ExtractConfig { downsample, threshold, final_threshold }
    }

    #[test]
    fn test_track_point_validation() {
        assert!(TrackPoint::new(0, 51.5074, -0.1278).is_valid());
        assert!(!TrackPoint::new(0, 91.0, 0.0).is_valid());
        assert!(!TrackPoint::new(0, 0.0, 181.0).is_valid());
        assert!(!TrackPoint::new(0, f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_street_normalization() {
        assert_eq!(Street::named("High Street"), Street::Named("High Street".to_string()));
        assert_eq!(Street::named("   "), Street::Unknown);
        assert_eq!(Street::from_option(None), Street::Unknown);
        assert_eq!(Street::named("Mill Lane").as_name(), Some("Mill Lane"));
        assert!(Street::Unknown.is_unknown());
        assert_eq!(Street::Unknown.to_string(), "<unknown>");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractConfig::default();
        assert_eq!(config, ExtractConfig { downsample: 5, threshold: 3, final_threshold: 2 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(config(0, 3, 2).validate().is_err());
        assert!(config(1, 0, 0).validate().is_err());
        assert!(config(1, 3, 0).validate().is_err());
        assert!(config(1, 2, 3).validate().is_err());
        assert!(config(1, 1, 1).validate().is_ok());
    }

    #[test]
    fn test_scripted_pipeline() {
        let resolver = ScriptedResolver::from_names(
            ["A", "A", "A", "B", "B", "A", "A", "A", "A", "C", "C"].map(Some),
        );
        let track = straight_track(11);
        let streets = extract_streets(&track, &resolver, &config(1, 3, 2)).unwrap();
        assert_eq!(streets, vec!["A", "C"]);
        assert_eq!(resolver.remaining(), 0);
    }

    #[test]
    fn test_downsampled_pipeline_resolves_last_point() {
        let calls = AtomicUsize::new(0);
        let resolver = |lat: f64, _lon: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            if lat < 51.5018 {
                Street::named("Long Road")
            } else {
                Street::named("Short Close")
            }
        };

        // 21 points, downsample 4: indices 0,4,8,12,16,20 -> Long x5, Short x1 (index 20 is 51.502)
        let track = straight_track(21);
        let streets = extract_streets(&track, &resolver, &config(4, 3, 1)).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 6);
        assert_eq!(streets, vec!["Long Road", "Short Close"]);
    }

    #[test]
    fn test_confirmed_offsets() {
        let resolver = ScriptedResolver::from_names([None, Some("A"), Some("A"), Some("A")]);
        let track = straight_track(4);
        let confirmed = extract_confirmed_streets(&track, &resolver, &config(1, 3, 2)).unwrap();

        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].first_index, 1);
        let start = track_start_time(&track);
        assert_eq!(start, Some(1000.0));
        assert_eq!(confirmed[0].offset_from(start), 5.0);
        assert_eq!(format_offset(confirmed[0].offset_from(start)), "00:05");
    }

    #[test]
    fn test_invalid_config_makes_no_calls() {
        let calls = AtomicUsize::new(0);
        let resolver = |_lat: f64, _lon: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            Street::named("A")
        };
        let err = extract_streets(&straight_track(10), &resolver, &config(1, 2, 3)).unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_out_of_order_track_makes_no_calls() {
        let calls = AtomicUsize::new(0);
        let resolver = |_lat: f64, _lon: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            Street::named("A")
        };
        let track = vec![
            TrackPoint::new(0, 51.50, -0.12),
            TrackPoint::new(2, 51.51, -0.12),
            TrackPoint::new(1, 51.52, -0.12),
        ];
        let err = extract_streets(&track, &resolver, &ExtractConfig::default()).unwrap_err();
        assert_eq!(err, ExtractError::SequenceOrder { previous: 2, current: 1 });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_track() {
        let resolver = |_lat: f64, _lon: f64| Street::named("A");
        let streets = extract_streets(&[], &resolver, &ExtractConfig::default()).unwrap();
        assert!(streets.is_empty());
    }

    #[test]
    fn test_all_unknown_track() {
        let resolver = |_lat: f64, _lon: f64| Street::Unknown;
        let streets = extract_streets(&straight_track(30), &resolver, &ExtractConfig::default()).unwrap();
        assert!(streets.is_empty());
    }

    #[test]
    fn test_static_resolver_pipeline() {
        let resolver = StaticResolver::new(15.0)
            .with_street(51.5000, -0.1278, "Church Street")
            .with_street(51.5010, -0.1278, "Church Street")
            .with_street(51.5020, -0.1278, "Market Square");

        let track = straight_track(25);
        let streets = extract_streets(&track, &resolver, &config(1, 3, 2)).unwrap();
        assert_eq!(streets, vec!["Church Street", "Market Square"]);
    }

    #[test]
    fn test_batch_keeps_runs_independent() {
        let resolver = |lat: f64, _lon: f64| {
            if lat < 51.501 { Street::named("Low Road") } else { Street::named("High Road") }
        };
        let tracks = vec![
            StreetTrack { track_id: "short".to_string(), points: straight_track(5) },
            StreetTrack {
                track_id: "broken".to_string(),
                points: vec![TrackPoint::new(3, 51.5, -0.12), TrackPoint::new(3, 51.5, -0.12)],
            },
            StreetTrack { track_id: "long".to_string(), points: straight_track(30) },
        ];

        let results = extract_streets_batch(&tracks, &resolver, &config(1, 3, 2));
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].track_id, "short");
        let names = |r: &TrackStreets| -> Vec<String> {
            r.streets.as_ref().unwrap().iter().map(|c| c.name.clone()).collect()
        };
        assert_eq!(names(&results[0]), vec!["Low Road"]);
        assert!(matches!(results[1].streets, Err(ExtractError::SequenceOrder { .. })));
        assert_eq!(names(&results[2]), vec!["Low Road", "High Road"]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batch_matches_sequential() {
        let resolver = |lat: f64, _lon: f64| {
            if lat < 51.501 { Street::named("Low Road") } else { Street::named("High Road") }
        };
        let tracks: Vec<StreetTrack> = (5..15)
            .map(|n| StreetTrack { track_id: format!("t{}", n), points: straight_track(n * 2) })
            .collect();

        let sequential = extract_streets_batch(&tracks, &resolver, &config(2, 2, 1));
        let parallel = extract_streets_batch_parallel(&tracks, &resolver, &config(2, 2, 1));

        for (s, p) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(s.track_id, p.track_id);
            assert_eq!(s.streets, p.streets);
        }
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0.0), "00:00");
        assert_eq!(format_offset(59.99), "00:59");
        assert_eq!(format_offset(600.0), "10:00");
        assert_eq!(format_offset(-3.0), "00:00");
        assert_eq!(format_offset(f64::NAN), "00:00");
    }

    #[test]
    fn test_offset_without_times() {
        let street = ConfirmedStreet {
            name: "A".to_string(),
            first_index: 3,
            first_time: None,
            hits: 3,
            via_final: false,
        };
        assert_eq!(street.offset_from(Some(10.0)), 0.0);
        assert_eq!(track_start_time(&[TrackPoint::new(0, 0.0, 0.0)]), None);
    }
}
