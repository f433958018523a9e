use crate::foundation::core::Vec2;

/// Clockwise perpendicular, `(y, -x)`.
///
/// Both the guide curve normal and the reference frame axis go through this function, so the
/// sign convention only has to be consistent with itself.
#[inline]
pub(crate) fn perp(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Unit vector in the direction of `v`, or zero when `v` has no length.
#[inline]
pub(crate) fn unit_or_zero(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > 0.0 && len.is_finite() {
        v / len
    } else {
        Vec2::ZERO
    }
}

#[inline]
pub(crate) fn is_zero(v: Vec2) -> bool {
    v.x == 0.0 && v.y == 0.0
}

#[inline]
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a) * t + a
}
