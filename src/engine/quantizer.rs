//! # Geometric Quantizer
//!
//! Maps a stick sample to one of `segment_count` equal angular segments.
//!
//! The dead zone is compared against `dead_zone * sqrt(2)`, not the unit
//! radius; shipped mapping defaults are tuned to this convention.

use std::f64::consts::{SQRT_2, TAU};
use std::num::NonZeroUsize;

/// Returns the segment index for a sample, or `None` inside the dead zone.
///
/// Segment 0 starts at `offset_degrees` and indices grow in the direction of
/// increasing `atan2(y, x)`. A sample whose magnitude equals the dead-zone
/// radius is inside the dead zone.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use steno_stick::engine::quantize;
///
/// let six = NonZeroUsize::new(6).unwrap();
/// assert_eq!(quantize(0.6, 0.0, six, 1.0, 0.1), Some(0));
/// assert_eq!(quantize(0.6, 0.0, six, 0.1, 0.1), None);
/// ```
#[must_use]
pub fn quantize(
    dead_zone: f64,
    offset_degrees: f64,
    segment_count: NonZeroUsize,
    x: f64,
    y: f64,
) -> Option<usize> {
    if x.hypot(y) <= dead_zone * SQRT_2 {
        return None;
    }

    let count = segment_count.get();
    let angle = (y.atan2(x) - offset_degrees.to_radians()).rem_euclid(TAU);
    let segment = (angle / TAU * count as f64).floor() as usize;

    Some(segment % count)
}
