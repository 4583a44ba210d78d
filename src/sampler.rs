//! Down-sampling of track points before reverse geocoding.
//!
//! Every reverse-geocode is a network round trip, so only every `N`th point is
//! resolved. The last point of the track is always included so a short final
//! street still gets a chance at the final-partial confirmation.

use crate::{ExtractError, Result, TrackPoint};

/// Lazy iterator over the points selected for resolution.
///
/// Yields positions `0, N, 2N, …` below the last position, then the last
/// point, without repeating it when the stride already landed on it.
#[derive(Debug, Clone)]
pub struct Sampler<'a> {
    points: &'a [TrackPoint],
    stride: usize,
    next: usize,
    tail_done: bool,
}

impl<'a> Sampler<'a> {
    fn new(points: &'a [TrackPoint], stride: usize) -> Self {
        Self {
            points,
            stride,
            next: 0,
            tail_done: points.is_empty(),
        }
    }

    fn remaining(&self) -> usize {
        if self.tail_done {
            return 0;
        }
        let last = self.points.len() - 1;
        let strided = if self.next < last {
            (last - self.next).div_ceil(self.stride)
        } else {
            0
        };
        strided + 1
    }
}

impl<'a> Iterator for Sampler<'a> {
    type Item = &'a TrackPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tail_done {
            return None;
        }
        let last = self.points.len() - 1;

        if self.next < last {
            let point = &self.points[self.next];
            self.next += self.stride;
            return Some(point);
        }

        self.tail_done = true;
        Some(&self.points[last])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Sampler<'_> {}

/// Select the points to resolve from a full track.
///
/// Fails with [`ExtractError::Configuration`] if `downsample` is 0.
///
/// # Example
/// ```
/// use street_extractor::{sample, TrackPoint};
///
/// let track: Vec<TrackPoint> = (0..8)
///     .map(|i| TrackPoint::new(i, 51.5 + i as f64 * 0.001, -0.12))
///     .collect();
///
/// let picked: Vec<u32> = sample(&track, 3).unwrap().map(|p| p.index).collect();
/// assert_eq!(picked, vec![0, 3, 6, 7]);
/// ```
pub fn sample(points: &[TrackPoint], downsample: u32) -> Result<Sampler<'_>> {
    Ok(Sampler::new(points, stride(downsample)?))
}

/// Number of points [`sample`] will yield for a track of `len` points.
pub fn sampled_count(len: usize, downsample: u32) -> Result<usize> {
    let stride = stride(downsample)?;
    if len == 0 {
        return Ok(0);
    }
    Ok((len - 1).div_ceil(stride) + 1)
}

fn stride(downsample: u32) -> Result<usize> {
    if downsample < 1 {
        return Err(ExtractError::Configuration(format!(
            "downsample must be >= 1 (got {})",
            downsample
        )));
    }
    Ok(downsample as usize)
}
