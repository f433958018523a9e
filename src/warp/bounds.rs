//! Source region estimation.
//!
//! The warp is nonlinear, so the pre-image of a destination rectangle is not spanned by its four
//! mapped corners. Instead every border pixel and both diagonals are pushed through the
//! transform; the spread of the mapped points gives the source box, and the spread of the curve
//! coordinates (`along`, `distance`) gives the resolution needed to avoid gaps.

use crate::{
    foundation::{
        core::{Point, Quality, Rect, Vec2},
        math::unit_or_zero,
    },
    render::context::RendDesc,
    warp::transform::{CurveWarp, WarpSample},
};

pub const DEFAULT_MAX_SOURCE_DIM: u32 = 10_000;

/// Extra source pixels on every side, enough for the 4x4 bicubic footprint.
pub(crate) const MARGIN_PX: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRegion {
    /// Region to ask the wrapped context for, margin included.
    pub desc: RendDesc,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_along: f64,
    pub max_along: f64,
}

#[derive(Default)]
struct Probe {
    rect: Option<Rect>,
    min_distance: f64,
    max_distance: f64,
    min_along: f64,
    max_along: f64,
}

impl Probe {
    fn add(&mut self, s: WarpSample) {
        if !s.point.is_finite() || !s.distance.is_finite() || !s.along.is_finite() {
            return;
        }
        match self.rect {
            Some(r) => {
                self.rect = Some(r.union_pt(s.point));
                self.min_distance = self.min_distance.min(s.distance);
                self.max_distance = self.max_distance.max(s.distance);
                self.min_along = self.min_along.min(s.along);
                self.max_along = self.max_along.max(s.along);
            }
            None => {
                self.rect = Some(Rect::from_points(s.point, s.point));
                self.min_distance = s.distance;
                self.max_distance = s.distance;
                self.min_along = s.along;
                self.max_along = s.along;
            }
        }
    }
}

/// Predict the source region and resolution needed to resample `dest` through `warp`.
///
/// Falls back to `dest` itself when no probe maps to a finite point.
pub fn estimate_source_region(
    warp: &CurveWarp,
    dest: &RendDesc,
    quality: Quality,
    max_dim: u32,
) -> SourceRegion {
    let (tl, br) = (dest.tl, dest.br);
    let (pw, ph) = (dest.pw(), dest.ph());
    let mut probe = Probe::default();
    let mut visit = |p: Point| probe.add(warp.transform_sample(p, quality));

    visit(tl);

    // top and bottom edges
    for x in 0..dest.w {
        let px = tl.x + f64::from(x) * pw;
        visit(Point::new(px, tl.y));
        visit(Point::new(px, br.y));
    }

    // left and right edges
    for y in 0..dest.h {
        let py = tl.y + f64::from(y) * ph;
        visit(Point::new(tl.x, py));
        visit(Point::new(br.x, py));
    }

    // diagonals
    let steps = dest.w.max(dest.h);
    let inc = (br - tl) / f64::from(steps);
    for k in 0..steps {
        let k = f64::from(k);
        visit(Point::new(tl.x + k * inc.x, tl.y + k * inc.y));
        visit(Point::new(tl.x + k * inc.x, br.y - k * inc.y));
    }

    let Some(mut rect) = probe.rect else {
        tracing::debug!("no finite probe, using destination rect as source");
        return SourceRegion {
            desc: *dest,
            min_distance: 0.0,
            max_distance: 0.0,
            min_along: 0.0,
            max_along: 0.0,
        };
    };

    let (apw, aph) = (pw.abs(), ph.abs());
    // A collapsed box still needs a pixel of extent to sample from.
    if rect.width() <= 0.0 {
        rect = rect.inflate(apw, 0.0);
    }
    if rect.height() <= 0.0 {
        rect = rect.inflate(0.0, aph);
    }

    let ab = unit_or_zero(warp.frame().axis());
    let angle = ab.y.atan2(ab.x);
    let (sin, cos) = angle.sin_cos();
    let used_length = probe.max_along - probe.min_along;
    let render_width = probe.max_distance - probe.min_distance;

    let mut src_w = to_count(((used_length * cos).abs() + (render_width * sin).abs()) / apw);
    let mut src_h = to_count(((used_length * sin).abs() + (render_width * cos).abs()) / aph);

    // Never sample coarser than the destination grid.
    if rect.width() / f64::from(src_w) > apw {
        src_w = to_count(rect.width() / apw);
    }
    if rect.height() / f64::from(src_h) > aph {
        src_h = to_count(rect.height() / aph);
    }

    let max_dim = max_dim.max(1);
    src_w = src_w.min(max_dim);
    src_h = src_h.min(max_dim);

    let margin = Vec2::new(
        rect.width() / f64::from(src_w),
        rect.height() / f64::from(src_h),
    ) * f64::from(MARGIN_PX);
    let desc = RendDesc {
        tl: Point::new(rect.x0, rect.y0) - margin,
        br: Point::new(rect.x1, rect.y1) + margin,
        w: src_w + 2 * MARGIN_PX,
        h: src_h + 2 * MARGIN_PX,
    };

    tracing::debug!(
        src_w = desc.w,
        src_h = desc.h,
        used_length,
        render_width,
        "estimated warp source region"
    );

    SourceRegion {
        desc,
        min_distance: probe.min_distance,
        max_distance: probe.max_distance,
        min_along: probe.min_along,
        max_along: probe.max_along,
    }
}

/// Truncate a pixel count estimate, keeping at least one pixel.
fn to_count(v: f64) -> u32 {
    if v.is_finite() && v >= 1.0 {
        v.min(f64::from(u32::MAX - 2 * MARGIN_PX)) as u32
    } else {
        1
    }
}
