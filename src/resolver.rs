//! Reverse-geocoding capability injected into the extraction pipeline.
//!
//! The pipeline never talks to a network itself. It asks a [`StreetResolver`]
//! for the street at each sampled coordinate, and the resolver is responsible
//! for pacing, timeouts and mapping every failure to [`Street::Unknown`].
//!
//! Any `Fn(f64, f64) -> Street` closure is a resolver. Two in-memory resolvers
//! are provided for tests and offline use:
//!
//! | Resolver | Answers with |
//! |----------|--------------|
//! | [`StaticResolver`] | Name of the nearest registered location within a radius |
//! | [`ScriptedResolver`] | A fixed sequence of answers, in call order |

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::geo_utils::haversine_distance;
use crate::{Street, TrackPoint};

/// Something that can name the street at a coordinate.
pub trait StreetResolver {
    /// Resolve a WGS84 coordinate to a street name, or [`Street::Unknown`].
    fn resolve(&self, latitude: f64, longitude: f64) -> Street;
}

impl<F> StreetResolver for F
where
    F: Fn(f64, f64) -> Street,
{
    fn resolve(&self, latitude: f64, longitude: f64) -> Street {
        self(latitude, longitude)
    }
}

// =============================================================================
// Static (nearest location) resolver
// =============================================================================

#[derive(Debug, Clone)]
struct KnownLocation {
    point: TrackPoint,
    street: String,
}

/// In-memory geocoder backed by a list of known street locations.
///
/// A lookup returns the street of the closest registered location, provided it
/// lies within `max_distance_m` meters; otherwise [`Street::Unknown`].
///
/// # Example
/// ```
/// use street_extractor::{StaticResolver, Street, StreetResolver};
///
/// let resolver = StaticResolver::new(50.0)
///     .with_street(51.5074, -0.1278, "Whitehall")
///     .with_street(51.5101, -0.1340, "Pall Mall");
///
/// assert_eq!(resolver.resolve(51.5075, -0.1279), Street::named("Whitehall"));
/// assert_eq!(resolver.resolve(48.8566, 2.3522), Street::Unknown);
/// ```
#[derive(Debug, Clone)]
pub struct StaticResolver {
    locations: Vec<KnownLocation>,
    max_distance_m: f64,
}

impl StaticResolver {
    /// Create an empty resolver with the given match radius in meters.
    pub fn new(max_distance_m: f64) -> Self {
        Self {
            locations: Vec::new(),
            max_distance_m,
        }
    }

    /// Register a street at a coordinate.
    pub fn with_street(mut self, latitude: f64, longitude: f64, street: &str) -> Self {
        self.add_street(latitude, longitude, street);
        self
    }

    /// Register a street at a coordinate.
    pub fn add_street(&mut self, latitude: f64, longitude: f64, street: &str) {
        self.locations.push(KnownLocation {
            point: TrackPoint::new(0, latitude, longitude),
            street: street.to_string(),
        });
    }

    /// Number of registered locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl StreetResolver for StaticResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> Street {
        let query = TrackPoint::new(0, latitude, longitude);
        if !query.is_valid() {
            return Street::Unknown;
        }

        self.locations
            .iter()
            .map(|loc| (loc, haversine_distance(&query, &loc.point)))
            .filter(|(_, dist)| *dist <= self.max_distance_m)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map_or(Street::Unknown, |(loc, _)| Street::named(loc.street.as_str()))
    }
}

// =============================================================================
// Scripted resolver
// =============================================================================

/// Resolver that replays a fixed list of answers, ignoring coordinates.
///
/// Once the script is exhausted every call returns [`Street::Unknown`].
#[derive(Debug)]
pub struct ScriptedResolver {
    answers: Mutex<VecDeque<Street>>,
}

impl ScriptedResolver {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Street>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
        }
    }

    /// Build a script from optional names; `None` and blank names become UNKNOWN.
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        Self::new(names.into_iter().map(|n| Street::from_option(n.map(str::to_string))))
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.lock().map_or(0, |a| a.len())
    }
}

impl StreetResolver for ScriptedResolver {
    fn resolve(&self, _latitude: f64, _longitude: f64) -> Street {
        match self.answers.lock() {
            Ok(mut answers) => answers.pop_front().unwrap_or(Street::Unknown),
            Err(_) => Street::Unknown,
        }
    }
}
