use std::io::Read;

use crate::{
    curve::guide::GuidePoint,
    foundation::{
        core::{Point, Quality, Vec2},
        error::WarpResult,
    },
    render::resample::RenderThreading,
    warp::bounds::DEFAULT_MAX_SOURCE_DIM,
};

/// Environment variable overriding [`RenderSettings::max_source_dim`].
pub const MAX_SOURCE_DIM_ENV: &str = "CURVEWARP_MAX_SOURCE_DIM";

/// Serializable layer parameters. Missing fields take the layer defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CurveWarpParams {
    /// Offset applied to the guide curve.
    pub origin: Vec2,
    pub start_point: Point,
    pub end_point: Point,
    /// Expansion of the result perpendicular to the reference line.
    pub perp_width: f64,
    /// Approximate closest-point search; renders quickly but with artifacts.
    pub fast: bool,
    pub points: Vec<GuidePoint>,
}

impl Default for CurveWarpParams {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            start_point: Point::new(-2.5, -0.5),
            end_point: Point::new(2.5, -0.3),
            perp_width: 1.0,
            fast: true,
            points: vec![
                GuidePoint::new(Point::new(-2.5, 0.0), Vec2::new(1.0, 0.1), 1.0),
                GuidePoint::new(Point::new(2.5, 0.0), Vec2::new(1.0, -0.1), 1.0),
            ],
        }
    }
}

impl CurveWarpParams {
    pub fn from_json_str(s: &str) -> WarpResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_reader<R: Read>(r: R) -> WarpResult<Self> {
        Ok(serde_json::from_reader(r)?)
    }

    pub fn to_json_pretty(&self) -> WarpResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub quality: Quality,
    pub threading: RenderThreading,
    /// Upper bound on the source buffer size along each axis, before the sampling margin.
    pub max_source_dim: u32,
}

impl RenderSettings {
    pub fn new(quality: Quality) -> Self {
        let max_source_dim = std::env::var(MAX_SOURCE_DIM_ENV)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_SOURCE_DIM);
        Self {
            quality,
            threading: RenderThreading::default(),
            max_source_dim,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new(Quality::default())
    }
}
