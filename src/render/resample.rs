use rayon::prelude::*;

use crate::{
    config::RenderSettings,
    foundation::{
        core::{Quality, Rgba8Premul},
        error::{WarpError, WarpResult},
    },
    render::{
        context::{
            PROGRESS_BAND_ROWS, PixelBuffer, ProgressCallback, RendDesc, RenderContext,
            SubProgress,
        },
        sample::Filter,
    },
    warp::{bounds::estimate_source_region, transform::CurveWarp},
};

/// Total progress units reported for one warp render.
pub(crate) const PROGRESS_TOTAL: u64 = 10_000;

/// Progress units given to rendering the source region; resampling gets the rest.
pub(crate) const SOURCE_STAGE_END: u64 = 9_000;

#[derive(Clone, Debug)]
pub struct RenderThreading {
    /// Fill scanlines on a rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Scanlines between two progress reports.
    pub band_rows: usize,
    /// Worker count for the dedicated pool; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            band_rows: PROGRESS_BAND_ROWS,
            threads: None,
        }
    }
}

/// Render `desc` as seen through `warp`.
///
/// Pipeline:
/// 1. [`estimate_source_region`] sizes the region the guide curve maps from.
/// 2. The wrapped context renders that region once (progress `0..9000` of `10000`).
/// 3. Every destination pixel is mapped and sampled with the quality's [`Filter`], band by band
///    (progress `9000..10000`). Pixels mapping outside the source buffer ask the context
///    directly.
///
/// A progress callback returning `false` aborts with [`WarpError::Cancelled`]; errors from the
/// context are returned unchanged.
#[tracing::instrument(
    skip_all,
    fields(w = desc.w, h = desc.h, quality = settings.quality.0, parallel = settings.threading.parallel)
)]
pub fn render_warp<C: RenderContext + ?Sized>(
    warp: &CurveWarp,
    ctx: &C,
    desc: &RendDesc,
    settings: &RenderSettings,
    progress: &mut dyn ProgressCallback,
) -> WarpResult<PixelBuffer> {
    warp.validate()?;
    desc.validate()?;
    let quality = settings.quality;

    let region = estimate_source_region(warp, desc, quality, settings.max_source_dim);
    let src = {
        let mut stage = SubProgress::new(progress, 0, SOURCE_STAGE_END, PROGRESS_TOTAL);
        ctx.render(&region.desc, quality, &mut stage)?
    };
    if src.width != region.desc.w || src.height != region.desc.h {
        return Err(WarpError::render(format!(
            "context returned {}x{} pixels for a {}x{} region",
            src.width, src.height, region.desc.w, region.desc.h
        )));
    }

    let job = Resample {
        warp,
        ctx,
        src: &src,
        src_desc: &region.desc,
        dest: desc,
        filter: Filter::for_quality(quality),
        quality,
    };

    let mut out = PixelBuffer::new(desc.w, desc.h)?;
    let row_bytes = out.row_bytes();
    let total_rows = desc.h as usize;
    let band_rows = settings.threading.band_rows.clamp(1, total_rows);
    let (pool, bands_per_batch) = if settings.threading.parallel {
        let pool = build_thread_pool(settings.threading.threads)?;
        let n = pool.current_num_threads().max(1);
        (Some(pool), n)
    } else {
        (None, 1)
    };

    let mut fallbacks = 0usize;
    {
        let mut stage = SubProgress::new(progress, SOURCE_STAGE_END, PROGRESS_TOTAL, PROGRESS_TOTAL);
        let batch_rows = band_rows.saturating_mul(bands_per_batch).min(total_rows);
        for (b, batch) in out.data.chunks_mut(batch_rows * row_bytes).enumerate() {
            let first_row = b * batch_rows;
            fallbacks += match &pool {
                Some(pool) => pool.install(|| {
                    batch
                        .par_chunks_mut(row_bytes)
                        .enumerate()
                        .map(|(r, row)| job.fill_row(first_row + r, row))
                        .sum::<usize>()
                }),
                None => batch
                    .chunks_mut(row_bytes)
                    .enumerate()
                    .map(|(r, row)| job.fill_row(first_row + r, row))
                    .sum::<usize>(),
            };

            let rows = batch.len() / row_bytes;
            let mut done = 0;
            while done < rows {
                done = (done + band_rows).min(rows);
                if !stage.amount_complete((first_row + done) as u64, u64::from(desc.h)) {
                    return Err(WarpError::Cancelled);
                }
            }
        }
    }

    if !progress.amount_complete(PROGRESS_TOTAL, PROGRESS_TOTAL) {
        return Err(WarpError::Cancelled);
    }

    tracing::debug!(
        src_w = region.desc.w,
        src_h = region.desc.h,
        fallbacks,
        "warp resample complete"
    );
    Ok(out)
}

/// Immutable state shared by every scanline worker.
struct Resample<'a, C: ?Sized> {
    warp: &'a CurveWarp,
    ctx: &'a C,
    src: &'a PixelBuffer,
    src_desc: &'a RendDesc,
    dest: &'a RendDesc,
    filter: Filter,
    quality: Quality,
}

impl<C: RenderContext + ?Sized> Resample<'_, C> {
    /// Fill one destination row, returning how many pixels fell back to a direct lookup.
    fn fill_row(&self, y: usize, row: &mut [u8]) -> usize {
        let (src_w, src_h) = (f64::from(self.src.width), f64::from(self.src.height));
        let (spw, sph) = (self.src_desc.pw(), self.src_desc.ph());
        let mut fallbacks = 0;

        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let p = self.dest.pixel_pos(x as u32, y as u32);
            let q = self.warp.transform_sample(p, self.quality).point;
            let u = (q.x - self.src_desc.tl.x) / spw;
            let v = (q.y - self.src_desc.tl.y) / sph;

            let c: Rgba8Premul = if u.is_finite()
                && v.is_finite()
                && u >= 0.0
                && v >= 0.0
                && u < src_w
                && v < src_h
            {
                self.filter.sample(self.src, u, v)
            } else {
                fallbacks += 1;
                self.ctx.get_color(q)
            };
            px.copy_from_slice(&c.to_array());
        }

        if fallbacks > 0 {
            tracing::trace!(y, fallbacks, "row sampled outside source region");
        }
        fallbacks
    }
}

fn build_thread_pool(threads: Option<usize>) -> WarpResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(WarpError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| WarpError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/resample.rs"]
mod tests;
