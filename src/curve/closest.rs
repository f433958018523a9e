//! Closest point on a guide curve.
//!
//! Two strategies are offered. [`SearchMode::Approximate`] picks a segment from seven fixed
//! samples per segment, then refines only the winner. [`SearchMode::Precise`] refines every
//! segment and also tests the exact endpoints.

use crate::{
    curve::{guide::GuideCurve, segment::CurveSegment},
    foundation::core::{Point, Quality},
};

/// Fixed per-segment sample parameters of the approximate search.
pub(crate) const SAMPLES: [f64; 7] = [
    0.0001,
    1.0 / 6.0,
    2.0 / 6.0,
    3.0 / 6.0,
    4.0 / 6.0,
    5.0 / 6.0,
    0.9999,
];

const SAMPLE_SPACING: f64 = 1.0 / 6.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SearchMode {
    /// Fixed sampling, bounded cost. Used for interactive passes.
    #[default]
    Approximate,
    /// Bracketed refinement on every segment.
    Precise,
}

impl SearchMode {
    pub fn from_fast(fast: bool) -> Self {
        if fast { Self::Approximate } else { Self::Precise }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoint {
    /// Index of the segment (and of its starting guide point).
    pub segment: usize,
    /// Local parameter in `[0, 1]`.
    pub t: f64,
    /// Arc length from the start of the curve to the closest point.
    pub along: f64,
    /// The closest point sits on one of the two open ends of the whole curve.
    pub extreme: bool,
}

/// Bracketed search iteration count for a quality level.
pub fn search_iterations(quality: Quality) -> u32 {
    match quality.0 {
        0..=6 => 7,
        7 => 6,
        8 => 5,
        _ => 4,
    }
}

/// Find the point of `curve` closest to `p`.
///
/// Returns `None` for curves with fewer than two points; callers handle those explicitly.
pub fn find_closest(
    curve: &GuideCurve,
    p: Point,
    mode: SearchMode,
    quality: Quality,
) -> Option<ClosestPoint> {
    let last = curve.segment_count().checked_sub(1)?;
    let iterations = search_iterations(quality);

    let (segment, t, extreme) = match mode {
        SearchMode::Approximate => approximate(curve, p, last, iterations)?,
        SearchMode::Precise => precise(curve, p, last, iterations)?,
    };
    let seg = curve.segment(segment)?;

    Some(ClosestPoint {
        segment,
        t,
        along: curve.length_before(segment) + seg.arclen_to(t),
        extreme,
    })
}

fn approximate(
    curve: &GuideCurve,
    p: Point,
    last: usize,
    iterations: u32,
) -> Option<(usize, f64, bool)> {
    let (i, sample) = best_curve_sample(curve, p)?;
    let extreme = (i == 0 && sample < 0.01) || (i == last && sample > 0.99);
    let seg = curve.segment(i)?;
    Some((i, refine(&seg, p, sample, iterations), extreme))
}

/// Segment index and sample parameter nearest to `p` over every segment's [`SAMPLES`].
///
/// Ties keep the earliest sample.
pub(crate) fn best_curve_sample(curve: &GuideCurve, p: Point) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, seg) in curve.segments().enumerate() {
        for &s in &SAMPLES {
            let d = seg.dist_sq(s, p);
            if best.is_none_or(|(_, _, bd)| d < bd) {
                best = Some((i, s, d));
            }
        }
    }
    best.map(|(i, s, _)| (i, s))
}

fn precise(
    curve: &GuideCurve,
    p: Point,
    last: usize,
    iterations: u32,
) -> Option<(usize, f64, bool)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, seg) in curve.segments().enumerate() {
        let seed = best_sample(&seg, p);
        let refined = refine(&seg, p, seed, iterations);

        let mut local = (refined, seg.dist_sq(refined, p));
        for end in [0.0, 1.0] {
            let d = seg.dist_sq(end, p);
            if d < local.1 {
                local = (end, d);
            }
        }

        if best.is_none_or(|(_, _, bd)| local.1 < bd) {
            best = Some((i, local.0, local.1));
        }
    }

    let (i, t, _) = best?;
    let extreme = (i == 0 && t == 0.0) || (i == last && t == 1.0);
    Some((i, t, extreme))
}

fn best_sample(seg: &CurveSegment, p: Point) -> f64 {
    let mut best = (SAMPLES[0], f64::INFINITY);
    for &s in &SAMPLES {
        let d = seg.dist_sq(s, p);
        if d < best.1 {
            best = (s, d);
        }
    }
    best.0
}

/// Bracketed minimisation of the distance to `p` around `seed`.
///
/// Each iteration compares the one-third and two-thirds points of the bracket and keeps the half
/// holding the smaller one. For a locally quadratic distance this is an exact bisection on the
/// minimum.
pub(crate) fn refine(seg: &CurveSegment, p: Point, seed: f64, iterations: u32) -> f64 {
    let mut lo = (seed - SAMPLE_SPACING).max(0.0);
    let mut hi = (seed + SAMPLE_SPACING).min(1.0);
    for _ in 0..iterations {
        let w = hi - lo;
        let mid = (lo + hi) * 0.5;
        if seg.dist_sq(lo + w / 3.0, p) < seg.dist_sq(lo + 2.0 * w / 3.0, p) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (lo + hi) * 0.5
}

#[cfg(test)]
#[path = "../../tests/unit/curve/closest.rs"]
mod tests;
