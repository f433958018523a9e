use crate::{
    curve::segment::CurveSegment,
    foundation::{
        core::{Point, Vec2},
        error::{WarpError, WarpResult},
    },
};

/// Control point of a guide curve.
///
/// `tangent_in` and `tangent_out` are equal unless `split_tangent` is set, which marks a corner.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GuidePoint {
    pub vertex: Point,
    pub tangent_in: Vec2,
    pub tangent_out: Vec2,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default)]
    pub split_tangent: bool,
}

fn default_width() -> f64 {
    1.0
}

impl GuidePoint {
    pub fn new(vertex: Point, tangent: Vec2, width: f64) -> Self {
        Self {
            vertex,
            tangent_in: tangent,
            tangent_out: tangent,
            width,
            split_tangent: false,
        }
    }

    pub fn split(vertex: Point, tangent_in: Vec2, tangent_out: Vec2, width: f64) -> Self {
        Self {
            vertex,
            tangent_in,
            tangent_out,
            width,
            split_tangent: true,
        }
    }

    pub(crate) fn validate(&self) -> WarpResult<()> {
        if !self.vertex.is_finite() {
            return Err(WarpError::validation("guide point vertex must be finite"));
        }
        if !self.tangent_in.is_finite() || !self.tangent_out.is_finite() {
            return Err(WarpError::validation("guide point tangents must be finite"));
        }
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(WarpError::validation(
                "guide point width must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Open (non-looping) spline through an ordered list of [`GuidePoint`]s.
///
/// The total arc length is cached and recomputed eagerly on every mutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuideCurve {
    points: Vec<GuidePoint>,
    // arc length at the start of each segment, plus the total at the end
    offsets: Vec<f64>,
}

impl GuideCurve {
    pub fn new(points: Vec<GuidePoint>) -> Self {
        let mut curve = Self {
            points,
            offsets: Vec::new(),
        };
        curve.sync();
        curve
    }

    pub fn points(&self) -> &[GuidePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn set_points(&mut self, points: Vec<GuidePoint>) {
        self.points = points;
        self.sync();
    }

    pub fn push(&mut self, point: GuidePoint) {
        self.points.push(point);
        self.sync();
    }

    /// Total arc length (sum of segment lengths).
    pub fn length(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Arc length from the start of the curve to the start of segment `i`.
    pub fn length_before(&self, i: usize) -> f64 {
        self.offsets.get(i).copied().unwrap_or_else(|| self.length())
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Segment `i`, joining point `i` to point `i + 1`.
    pub fn segment(&self, i: usize) -> Option<CurveSegment> {
        let a = self.points.get(i)?;
        let b = self.points.get(i + 1)?;
        Some(CurveSegment::new(
            a.vertex,
            b.vertex,
            a.tangent_out,
            b.tangent_in,
        ))
    }

    pub fn segments(&self) -> impl Iterator<Item = CurveSegment> + '_ {
        self.points
            .windows(2)
            .map(|w| CurveSegment::new(w[0].vertex, w[1].vertex, w[0].tangent_out, w[1].tangent_in))
    }

    /// Index of the point before `i`, clamped at the first point.
    pub(crate) fn prev_index(&self, i: usize) -> usize {
        i.saturating_sub(1)
    }

    /// Index of the point after `i`, clamped at the last point.
    pub(crate) fn next_index(&self, i: usize) -> usize {
        (i + 1).min(self.points.len().saturating_sub(1))
    }

    pub(crate) fn validate(&self) -> WarpResult<()> {
        self.points.iter().try_for_each(GuidePoint::validate)
    }

    fn sync(&mut self) {
        let mut acc = 0.0;
        let mut offsets = Vec::with_capacity(self.points.len());
        offsets.push(acc);
        for seg in self.segments() {
            acc += seg.arclen();
            offsets.push(acc);
        }
        self.offsets = offsets;
    }
}
