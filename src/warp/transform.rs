use crate::{
    config::{CurveWarpParams, RenderSettings},
    curve::{
        closest::{SearchMode, find_closest},
        guide::{GuideCurve, GuidePoint},
        segment::CurveSegment,
    },
    foundation::{
        core::{Point, Quality, Rgba8Premul, Vec2},
        error::{WarpError, WarpResult},
        math::{is_zero, lerp, perp, unit_or_zero},
    },
    render::context::{
        HitTester, PixelBuffer, PointSampler, ProgressCallback, RegionRenderer, RendDesc,
        RenderContext,
    },
};

/// Step of the finite difference used to synthesise a tangent where the curve derivative is
/// exactly zero. An approximation of the true direction, not a derivative.
pub(crate) const FAKE_TANGENT_STEP: f64 = 0.000_001;

/// Smallest magnitude allowed for the interpolated curve width.
pub(crate) const TOO_THIN: f64 = 0.01;

/// Parameters closer than this to a segment end take the tangent edge-case path.
const EDGE_EPSILON: f64 = 0.000_01;

/// The straight segment and transverse scale the guide curve is unrolled onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceFrame {
    pub start_point: Point,
    pub end_point: Point,
    pub perp_width: f64,
    perp: Vec2,
}

impl ReferenceFrame {
    pub fn new(start_point: Point, end_point: Point, perp_width: f64) -> Self {
        Self {
            start_point,
            end_point,
            perp_width,
            perp: unit_or_zero(perp(end_point - start_point)),
        }
    }

    /// Unit vector perpendicular to `start_point -> end_point`.
    pub fn perp(&self) -> Vec2 {
        self.perp
    }

    pub fn axis(&self) -> Vec2 {
        self.end_point - self.start_point
    }

    fn validate(&self) -> WarpResult<()> {
        if !self.start_point.is_finite() || !self.end_point.is_finite() {
            return Err(WarpError::validation(
                "reference start/end points must be finite",
            ));
        }
        if !self.perp_width.is_finite() || self.perp_width == 0.0 {
            return Err(WarpError::validation(
                "perp_width must be finite and non-zero",
            ));
        }
        Ok(())
    }
}

/// A mapped point plus the curve-space coordinates it was derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarpSample {
    pub point: Point,
    /// Signed perpendicular distance from the guide curve (unscaled by width).
    pub distance: f64,
    /// Arc length along the guide curve, extrapolated past either open end.
    pub along: f64,
}

/// Foot of the query point on the guide curve.
#[derive(Clone, Copy, Debug)]
struct Foot {
    point: Point,
    tangent: Vec2,
    thickness: f64,
    t: f64,
    along: f64,
    extreme: bool,
    edge_case: bool,
}

/// The curve warp layer: guide curve, reference frame and search configuration.
///
/// Setters re-sync the cached arc length and perpendicular axis eagerly, so `transform` never
/// sees stale state.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveWarp {
    origin: Vec2,
    frame: ReferenceFrame,
    curve: GuideCurve,
    fast: bool,
}

impl Default for CurveWarp {
    fn default() -> Self {
        let p = CurveWarpParams::default();
        Self {
            origin: p.origin,
            frame: ReferenceFrame::new(p.start_point, p.end_point, p.perp_width),
            curve: GuideCurve::new(p.points),
            fast: p.fast,
        }
    }
}

impl CurveWarp {
    pub fn new(curve: GuideCurve, frame: ReferenceFrame) -> WarpResult<Self> {
        let warp = Self {
            origin: Vec2::ZERO,
            frame,
            curve,
            fast: true,
        };
        warp.validate()?;
        Ok(warp)
    }

    pub fn from_params(params: CurveWarpParams) -> WarpResult<Self> {
        let warp = Self {
            origin: params.origin,
            frame: ReferenceFrame::new(params.start_point, params.end_point, params.perp_width),
            curve: GuideCurve::new(params.points),
            fast: params.fast,
        };
        warp.validate()?;
        Ok(warp)
    }

    pub fn params(&self) -> CurveWarpParams {
        CurveWarpParams {
            origin: self.origin,
            start_point: self.frame.start_point,
            end_point: self.frame.end_point,
            perp_width: self.frame.perp_width,
            fast: self.fast,
            points: self.curve.points().to_vec(),
        }
    }

    pub fn validate(&self) -> WarpResult<()> {
        if !self.origin.is_finite() {
            return Err(WarpError::validation("origin must be finite"));
        }
        self.frame.validate()?;
        self.curve.validate()
    }

    pub fn curve(&self) -> &GuideCurve {
        &self.curve
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn fast(&self) -> bool {
        self.fast
    }

    pub fn search_mode(&self) -> SearchMode {
        SearchMode::from_fast(self.fast)
    }

    pub fn set_points(&mut self, points: Vec<GuidePoint>) -> WarpResult<()> {
        let curve = GuideCurve::new(points);
        curve.validate()?;
        self.curve = curve;
        Ok(())
    }

    pub fn set_frame(
        &mut self,
        start_point: Point,
        end_point: Point,
        perp_width: f64,
    ) -> WarpResult<()> {
        let frame = ReferenceFrame::new(start_point, end_point, perp_width);
        frame.validate()?;
        self.frame = frame;
        Ok(())
    }

    pub fn set_origin(&mut self, origin: Vec2) -> WarpResult<()> {
        if !origin.is_finite() {
            return Err(WarpError::validation("origin must be finite"));
        }
        self.origin = origin;
        Ok(())
    }

    pub fn set_fast(&mut self, fast: bool) {
        self.fast = fast;
    }

    /// Map `p` into the reference frame at the highest search quality.
    pub fn transform(&self, p: Point) -> Point {
        self.transform_sample(p, Quality::BEST).point
    }

    /// Map `p` into the reference frame, also reporting the curve-space coordinates.
    pub fn transform_sample(&self, p: Point, quality: Quality) -> WarpSample {
        let q = p - self.origin;
        let Some(foot) = self.foot(q, quality) else {
            return WarpSample {
                point: Point::ZERO,
                distance: 0.0,
                along: 0.0,
            };
        };

        let (along, diff) = if foot.extreme {
            let points = self.curve.points();
            let (tangent, base) = if foot.t < 0.5 {
                (points.first().map(|gp| gp.tangent_in), 0.0)
            } else {
                (points.last().map(|gp| gp.tangent_out), self.curve.length())
            };
            let tangent = unit_or_zero(tangent.unwrap_or(Vec2::ZERO));
            (base + (q - foot.point).dot(tangent), perp(tangent))
        } else if foot.edge_case {
            let mut diff = foot.point - q;
            if diff.dot(perp(foot.tangent)) < 0.0 {
                diff = -diff;
            }
            (foot.along, unit_or_zero(diff))
        } else {
            (foot.along, perp(foot.tangent))
        };

        let distance = (q - foot.point).dot(diff);
        let total = self.curve.length();
        let ratio = if total != 0.0 { along / total } else { 0.0 };
        let point = self.frame.start_point
            + self.frame.axis() * ratio
            + self.frame.perp * (distance / (clamp_thickness(foot.thickness) * self.frame.perp_width));

        WarpSample {
            point,
            distance,
            along,
        }
    }

    fn foot(&self, q: Point, quality: Quality) -> Option<Foot> {
        let points = self.curve.points();
        match points {
            [] => None,
            [only] => Some(Foot {
                point: only.vertex,
                // Unnormalised: the tangent's length scales the mapped distance.
                tangent: only.tangent_in,
                thickness: only.width,
                t: 0.5,
                along: 0.0,
                extreme: false,
                edge_case: false,
            }),
            _ => {
                let cp = find_closest(&self.curve, q, self.search_mode(), quality)?;
                let i = cp.segment;
                let seg = self.curve.segment(i)?;
                let (a, b) = (points.get(i)?, points.get(i + 1)?);

                let mut tangent = seg.deriv(cp.t);
                let mut edge_case = false;
                if (cp.t < EDGE_EPSILON || cp.t > 1.0 - EDGE_EPSILON)
                    && let Some(averaged) = self.boundary_tangent(i, &seg, cp.t, tangent)
                {
                    tangent = averaged;
                    edge_case = true;
                }

                Some(Foot {
                    point: seg.eval(cp.t),
                    tangent: unit_or_zero(tangent),
                    thickness: lerp(a.width, b.width, cp.t),
                    t: cp.t,
                    along: cp.along,
                    extreme: cp.extreme,
                    edge_case,
                })
            }
        }
    }

    /// Tangent at a segment end shared with a split point (or where the derivative vanishes):
    /// the sum of the unit tangents on both sides of the guide point.
    ///
    /// Returns `None` when the plain segment tangent can be used.
    fn boundary_tangent(&self, i: usize, seg: &CurveSegment, t: f64, raw: Vec2) -> Option<Vec2> {
        let points = self.curve.points();
        let zero = is_zero(raw);

        let (tangent, other) = if t < 0.5 {
            let here = points.get(i)?;
            if !(here.split_tangent || zero) {
                return None;
            }
            let tangent = if zero {
                seg.eval(FAKE_TANGENT_STEP) - seg.eval(0.0)
            } else {
                raw
            };
            let mut other = here.tangent_in;
            if is_zero(other) {
                let prev = points.get(self.curve.prev_index(i))?;
                let before =
                    CurveSegment::new(prev.vertex, here.vertex, prev.tangent_out, here.tangent_in);
                other = before.eval(1.0) - before.eval(1.0 - FAKE_TANGENT_STEP);
            }
            (tangent, other)
        } else {
            let here = points.get(i + 1)?;
            if !(here.split_tangent || zero) {
                return None;
            }
            let tangent = if zero {
                seg.eval(1.0) - seg.eval(1.0 - FAKE_TANGENT_STEP)
            } else {
                raw
            };
            let mut other = here.tangent_out;
            if is_zero(other) {
                let next = points.get(self.curve.next_index(i + 1))?;
                let after =
                    CurveSegment::new(here.vertex, next.vertex, here.tangent_out, next.tangent_in);
                other = after.eval(FAKE_TANGENT_STEP) - after.eval(0.0);
            }
            (tangent, other)
        };

        Some(unit_or_zero(other) + unit_or_zero(tangent))
    }

    /// Color of the warped content at `p`: the context queried at the mapped point.
    pub fn get_color<S: PointSampler + ?Sized>(&self, ctx: &S, p: Point) -> Rgba8Premul {
        ctx.get_color(self.transform(p))
    }

    /// Hit test forwarded to the context at the mapped point.
    pub fn hit_check<H: HitTester + ?Sized>(&self, ctx: &H, p: Point) -> Option<H::Hit> {
        ctx.hit_check(self.transform(p))
    }

    /// Render `desc` through the warp with settings taken from the environment.
    pub fn render<C: RenderContext + ?Sized>(
        &self,
        ctx: &C,
        quality: Quality,
        desc: &RendDesc,
        progress: &mut dyn ProgressCallback,
    ) -> WarpResult<PixelBuffer> {
        let settings = RenderSettings::new(quality);
        crate::render::resample::render_warp(self, ctx, desc, &settings, progress)
    }

    pub fn render_with<C: RenderContext + ?Sized>(
        &self,
        ctx: &C,
        desc: &RendDesc,
        settings: &RenderSettings,
        progress: &mut dyn ProgressCallback,
    ) -> WarpResult<PixelBuffer> {
        crate::render::resample::render_warp(self, ctx, desc, settings, progress)
    }

    /// Wrap `ctx` so the warped result can itself be used as a render context.
    pub fn bind<'a, C: ?Sized>(&'a self, ctx: &'a C) -> Warped<'a, C> {
        Warped { warp: self, inner: ctx }
    }
}

/// Keep the width magnitude at or above [`TOO_THIN`], preserving its sign. Zero becomes positive.
///
/// Zero has no sign of its own. It resolves to `+TOO_THIN` so a zero-width point keeps content
/// on the side it came from; a negative result would mirror it across the curve.
pub(crate) fn clamp_thickness(thickness: f64) -> f64 {
    if thickness < TOO_THIN && thickness > -TOO_THIN {
        if thickness < 0.0 { -TOO_THIN } else { TOO_THIN }
    } else {
        thickness
    }
}

/// A context seen through a [`CurveWarp`]. Implements the render capabilities so warps nest.
#[derive(Clone, Copy, Debug)]
pub struct Warped<'a, C: ?Sized> {
    warp: &'a CurveWarp,
    inner: &'a C,
}

impl<C: PointSampler + ?Sized> PointSampler for Warped<'_, C> {
    fn get_color(&self, p: Point) -> Rgba8Premul {
        self.warp.get_color(self.inner, p)
    }
}

impl<C: RenderContext + ?Sized> RegionRenderer for Warped<'_, C> {
    fn render(
        &self,
        desc: &RendDesc,
        quality: Quality,
        progress: &mut dyn ProgressCallback,
    ) -> WarpResult<PixelBuffer> {
        self.warp.render(self.inner, quality, desc, progress)
    }
}

impl<C: HitTester + ?Sized> HitTester for Warped<'_, C> {
    type Hit = C::Hit;

    fn hit_check(&self, p: Point) -> Option<Self::Hit> {
        self.warp.hit_check(self.inner, p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/warp/transform.rs"]
mod tests;
