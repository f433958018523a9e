//! Curve-guided spatial warp.
//!
//! A [`CurveWarp`] maps points of a destination plane onto a straight reference segment
//! (`start_point -> end_point`) so that content rendered along that segment appears to follow an
//! open Hermite spline (the [`GuideCurve`]). Distance along the curve becomes distance along the
//! reference axis, and the signed perpendicular distance to the curve becomes an offset along the
//! reference perpendicular, scaled by the local curve width.
//!
//! # Pipeline overview
//!
//! 1. **Sync**: guide points and reference frame are cached together (total arc length, unit
//!    perpendicular) whenever parameters change.
//! 2. **Estimate**: the destination rectangle is probed through the transform to size the source
//!    region ([`estimate_source_region`]).
//! 3. **Render**: the wrapped context renders that region once ([`RegionRenderer`]).
//! 4. **Resample**: every destination pixel is mapped and sampled with a nearest, bilinear or
//!    bicubic filter ([`CurveWarp::render`]).
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Premultiplied RGBA8** end-to-end.
#![forbid(unsafe_code)]

mod config;
mod curve;
mod foundation;
mod render;
mod warp;

pub use config::{CurveWarpParams, MAX_SOURCE_DIM_ENV, RenderSettings};
pub use curve::closest::{ClosestPoint, SearchMode, find_closest, search_iterations};
pub use curve::guide::{GuideCurve, GuidePoint};
pub use curve::segment::CurveSegment;
pub use foundation::core::{CubicBez, Point, Quality, Rect, Rgba8Premul, Vec2};
pub use foundation::error::{WarpError, WarpResult};
pub use render::context::{
    HitTester, NoProgress, PixelBuffer, PointSampler, ProgressCallback, RegionRenderer,
    RendDesc, RenderContext, ShaderContext, SubProgress,
};
pub use render::resample::{RenderThreading, render_warp};
pub use render::sample::Filter;
pub use warp::bounds::{DEFAULT_MAX_SOURCE_DIM, SourceRegion, estimate_source_region};
pub use warp::transform::{CurveWarp, ReferenceFrame, WarpSample, Warped};
