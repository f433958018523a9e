use kurbo::{ParamCurve, ParamCurveArclen, ParamCurveDeriv};

use crate::foundation::core::{CubicBez, Point, Vec2};

/// Accuracy passed to kurbo's adaptive arc length integration.
pub(crate) const ARCLEN_ACCURACY: f64 = 1e-6;

/// Cubic Hermite segment between two vertices with their tangents.
///
/// Stored as the equivalent cubic Bezier (`p0`, `p0 + m0/3`, `p1 - m1/3`, `p1`), so the derivative
/// at the ends equals the Hermite tangents exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveSegment {
    bez: CubicBez,
}

impl CurveSegment {
    pub fn new(p0: Point, p1: Point, m0: Vec2, m1: Vec2) -> Self {
        Self {
            bez: CubicBez::new(p0, p0 + m0 / 3.0, p1 - m1 / 3.0, p1),
        }
    }

    /// Position at `t`. `t` is not clamped, probes slightly outside `[0, 1]` extrapolate.
    #[inline]
    pub fn eval(&self, t: f64) -> Point {
        self.bez.eval(t)
    }

    /// Unnormalised tangent at `t`.
    #[inline]
    pub fn deriv(&self, t: f64) -> Vec2 {
        self.bez.deriv().eval(t).to_vec2()
    }

    pub fn arclen(&self) -> f64 {
        self.bez.arclen(ARCLEN_ACCURACY)
    }

    /// Arc length of the `[0, t]` prefix.
    pub fn arclen_to(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return self.arclen();
        }
        self.bez.subsegment(0.0..t).arclen(ARCLEN_ACCURACY)
    }

    #[inline]
    pub(crate) fn dist_sq(&self, t: f64, p: Point) -> f64 {
        (self.eval(t) - p).hypot2()
    }
}
