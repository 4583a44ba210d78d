//! # Street Debouncer
//!
//! Turns a noisy stream of reverse-geocoded street names into a clean list of
//! streets actually travelled.
//!
//! Reverse geocoding is imprecise near intersections: a point a few meters
//! from a junction often resolves to the cross street. The debouncer only
//! accepts a change of street after `threshold` consecutive points agree on
//! the new name.
//!
//! ## States
//!
//! | State | Meaning |
//! |-------|---------|
//! | `NoCandidate` | Either nothing seen yet, or still on the last confirmed street |
//! | `Accumulating` | A different street has been seen `count` times in a row |
//!
//! UNKNOWN points are gaps: they neither extend nor break a run.
//!
//! When the stream ends, a pending candidate with at least `final_threshold`
//! hits is confirmed anyway. Tracks often end partway along a street, and the
//! last few samples are all there is.

use log::{debug, info};

use crate::{ConfirmedStreet, ExtractConfig, ExtractError, ResolvedPoint, Result, Street};

/// Observable state of the debouncer between inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState<'a> {
    /// No competing street pending (nothing seen, or still on the confirmed street)
    NoCandidate,
    /// `street` has been seen `count` times in a row without being confirmed yet
    Accumulating { street: &'a str, count: u32 },
}

#[derive(Debug, Clone)]
struct Candidate {
    street: String,
    count: u32,
    first_index: u32,
    first_time: Option<f64>,
}

impl Candidate {
    fn start(street: &str, point: &ResolvedPoint) -> Self {
        Self {
            street: street.to_string(),
            count: 1,
            first_index: point.index,
            first_time: point.time,
        }
    }

    fn confirm(self, via_final: bool) -> ConfirmedStreet {
        ConfirmedStreet {
            name: self.street,
            first_index: self.first_index,
            first_time: self.first_time,
            hits: self.count,
            via_final,
        }
    }
}

/// Sequential street-change filter.
///
/// Feed resolved points in increasing index order with [`process`](Self::process),
/// then call [`finalize`](Self::finalize) once to collect the confirmed streets.
///
/// # Example
/// ```
/// use street_extractor::{Debouncer, ExtractConfig, ResolvedPoint, Street};
///
/// let config = ExtractConfig { threshold: 3, final_threshold: 2, ..Default::default() };
/// let mut debouncer = Debouncer::new(&config).unwrap();
///
/// for (i, name) in ["High St", "High St", "High St", "Mill Ln", "Mill Ln"].iter().enumerate() {
///     debouncer.process(&ResolvedPoint::new(i as u32, Street::named(*name))).unwrap();
/// }
///
/// let streets: Vec<String> = debouncer.finalize().into_iter().map(|s| s.name).collect();
/// assert_eq!(streets, vec!["High St", "Mill Ln"]);
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    threshold: u32,
    final_threshold: u32,
    last_confirmed: Option<String>,
    candidate: Option<Candidate>,
    confirmed: Vec<ConfirmedStreet>,
    last_index: Option<u32>,
}

impl Debouncer {
    /// Create a debouncer, rejecting invalid thresholds up front.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            threshold: config.threshold,
            final_threshold: config.final_threshold,
            last_confirmed: None,
            candidate: None,
            confirmed: Vec::new(),
            last_index: None,
        })
    }

    /// Apply one resolved point.
    ///
    /// Returns the street confirmed by this point, if it completed a run.
    /// Fails if `point.index` does not strictly increase.
    pub fn process(&mut self, point: &ResolvedPoint) -> Result<Option<&ConfirmedStreet>> {
        if let Some(previous) = self.last_index {
            if point.index <= previous {
                return Err(ExtractError::SequenceOrder {
                    previous,
                    current: point.index,
                });
            }
        }
        self.last_index = Some(point.index);

        let name = match &point.street {
            Street::Named(name) => name.as_str(),
            Street::Unknown => return Ok(None),
        };

        if self.last_confirmed.as_deref() == Some(name) {
            if let Some(abandoned) = self.candidate.take() {
                debug!(
                    "[Debouncer] back on {:?} at #{}, dropping {:?} after {} hit(s)",
                    name, point.index, abandoned.street, abandoned.count
                );
            }
            return Ok(None);
        }

        match self.candidate.take() {
            Some(mut candidate) if candidate.street == name => {
                candidate.count += 1;
                if candidate.count >= self.threshold {
                    return Ok(Some(self.promote(candidate, false)));
                }
                self.candidate = Some(candidate);
            }
            _ => self.candidate = Some(Candidate::start(name, point)),
        }

        Ok(None)
    }

    /// Finish the stream, applying the final-partial confirmation.
    pub fn finalize(mut self) -> Vec<ConfirmedStreet> {
        if let Some(candidate) = self.candidate.take() {
            let differs = self.last_confirmed.as_deref() != Some(candidate.street.as_str());
            if differs && candidate.count >= self.final_threshold {
                self.promote(candidate, true);
            } else {
                debug!(
                    "[Debouncer] discarding trailing {:?} with {} hit(s) (final threshold {})",
                    candidate.street, candidate.count, self.final_threshold
                );
            }
        }
        self.confirmed
    }

    /// Current candidate, if any.
    pub fn state(&self) -> DebounceState<'_> {
        match &self.candidate {
            Some(c) => DebounceState::Accumulating {
                street: c.street.as_str(),
                count: c.count,
            },
            None => DebounceState::NoCandidate,
        }
    }

    /// Most recently confirmed street.
    pub fn last_confirmed(&self) -> Option<&str> {
        self.last_confirmed.as_deref()
    }

    /// Streets confirmed so far, not counting a pending final candidate.
    pub fn confirmed(&self) -> &[ConfirmedStreet] {
        &self.confirmed
    }

    fn promote(&mut self, candidate: Candidate, via_final: bool) -> &ConfirmedStreet {
        info!(
            "[Debouncer] confirmed {:?} from #{} after {} hit(s){}",
            candidate.street,
            candidate.first_index,
            candidate.count,
            if via_final { " (final segment)" } else { "" }
        );
        self.last_confirmed = Some(candidate.street.clone());
        self.confirmed.push(candidate.confirm(via_final));
        &self.confirmed[self.confirmed.len() - 1]
    }
}
