use crate::foundation::{
    core::{Point, Quality, Rect, Rgba8Premul, Vec2},
    error::{WarpError, WarpResult},
};

/// Scanlines rendered between two progress reports.
pub(crate) const PROGRESS_BAND_ROWS: usize = 32;

/// Destination descriptor: a world-space rectangle sampled on a `w x h` pixel grid.
///
/// Pixel `(x, y)` samples the world position `tl + (x * pw, y * ph)`. `br` may lie on either side
/// of `tl`, so the pitches can be negative (e.g. y-up world coordinates).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RendDesc {
    pub tl: Point,
    pub br: Point,
    pub w: u32,
    pub h: u32,
}

impl RendDesc {
    pub fn new(tl: Point, br: Point, w: u32, h: u32) -> WarpResult<Self> {
        let desc = Self { tl, br, w, h };
        desc.validate()?;
        Ok(desc)
    }

    pub fn validate(&self) -> WarpResult<()> {
        if self.w == 0 || self.h == 0 {
            return Err(WarpError::validation("render size must be non-zero"));
        }
        if !self.tl.is_finite() || !self.br.is_finite() {
            return Err(WarpError::validation("render rect must be finite"));
        }
        if self.tl.x == self.br.x || self.tl.y == self.br.y {
            return Err(WarpError::validation("render rect must have non-zero area"));
        }
        Ok(())
    }

    pub fn pw(&self) -> f64 {
        (self.br.x - self.tl.x) / f64::from(self.w)
    }

    pub fn ph(&self) -> f64 {
        (self.br.y - self.tl.y) / f64::from(self.h)
    }

    pub fn pixel_pos(&self, x: u32, y: u32) -> Point {
        self.tl + Vec2::new(f64::from(x) * self.pw(), f64::from(y) * self.ph())
    }

    pub fn rect(&self) -> Rect {
        Rect::from_points(self.tl, self.br)
    }
}

/// Premultiplied RGBA8 pixel grid.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> WarpResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> WarpResult<Self> {
        if data.len() != byte_len(width, height)? {
            return Err(WarpError::validation(
                "pixel buffer expects data matching width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Pixel at `(x, y)`; callers keep coordinates in range.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba8Premul {
        let idx = self.index(x, y);
        Rgba8Premul::from_array([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, c: Rgba8Premul) {
        let idx = self.index(x, y);
        self.data[idx..idx + 4].copy_from_slice(&c.to_array());
    }

    pub(crate) fn row_bytes(&self) -> usize {
        self.width as usize * 4
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn byte_len(width: u32, height: u32) -> WarpResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| WarpError::validation("pixel buffer size overflow"))
}

/// Progress sink. Returning `false` asks the caller to abort.
pub trait ProgressCallback {
    fn amount_complete(&mut self, done: u64, total: u64) -> bool;
}

impl<F: FnMut(u64, u64) -> bool> ProgressCallback for F {
    fn amount_complete(&mut self, done: u64, total: u64) -> bool {
        self(done, total)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn amount_complete(&mut self, _done: u64, _total: u64) -> bool {
        true
    }
}

/// Maps a child's `[0, total]` progress onto `[start, end]` of a parent out of `parent_total`.
pub struct SubProgress<'a> {
    parent: &'a mut dyn ProgressCallback,
    start: u64,
    end: u64,
    parent_total: u64,
}

impl<'a> SubProgress<'a> {
    pub fn new(
        parent: &'a mut dyn ProgressCallback,
        start: u64,
        end: u64,
        parent_total: u64,
    ) -> Self {
        Self {
            parent,
            start,
            end,
            parent_total,
        }
    }
}

impl ProgressCallback for SubProgress<'_> {
    fn amount_complete(&mut self, done: u64, total: u64) -> bool {
        let span = self.end.saturating_sub(self.start);
        let scaled = if total == 0 {
            span
        } else {
            span.saturating_mul(done.min(total)) / total
        };
        self.parent
            .amount_complete(self.start + scaled, self.parent_total)
    }
}

/// Renders a sub-region of the content into a new pixel buffer.
pub trait RegionRenderer {
    fn render(
        &self,
        desc: &RendDesc,
        quality: Quality,
        progress: &mut dyn ProgressCallback,
    ) -> WarpResult<PixelBuffer>;
}

/// Direct point query. `Sync` so samplers can be shared by parallel scanline workers.
pub trait PointSampler: Sync {
    fn get_color(&self, p: Point) -> Rgba8Premul;
}

/// Hit testing forwarded through layers.
pub trait HitTester {
    type Hit;

    fn hit_check(&self, p: Point) -> Option<Self::Hit>;
}

/// Both render capabilities; implemented for every type providing them.
pub trait RenderContext: RegionRenderer + PointSampler {}

impl<T: RegionRenderer + PointSampler + ?Sized> RenderContext for T {}

/// Context backed by a pure color function of world position.
#[derive(Clone, Copy, Debug)]
pub struct ShaderContext<F> {
    shader: F,
}

impl<F: Fn(Point) -> Rgba8Premul + Sync> ShaderContext<F> {
    pub fn new(shader: F) -> Self {
        Self { shader }
    }
}

impl<F: Fn(Point) -> Rgba8Premul + Sync> PointSampler for ShaderContext<F> {
    fn get_color(&self, p: Point) -> Rgba8Premul {
        (self.shader)(p)
    }
}

impl<F: Fn(Point) -> Rgba8Premul + Sync> RegionRenderer for ShaderContext<F> {
    fn render(
        &self,
        desc: &RendDesc,
        _quality: Quality,
        progress: &mut dyn ProgressCallback,
    ) -> WarpResult<PixelBuffer> {
        desc.validate()?;
        let mut out = PixelBuffer::new(desc.w, desc.h)?;
        for y in 0..desc.h {
            for x in 0..desc.w {
                out.set(x, y, (self.shader)(desc.pixel_pos(x, y)));
            }
            let done = y + 1;
            if (done as usize % PROGRESS_BAND_ROWS == 0 || done == desc.h)
                && !progress.amount_complete(u64::from(done), u64::from(desc.h))
            {
                return Err(WarpError::Cancelled);
            }
        }
        Ok(out)
    }
}

impl<F: Fn(Point) -> Rgba8Premul + Sync> HitTester for ShaderContext<F> {
    type Hit = Rgba8Premul;

    fn hit_check(&self, p: Point) -> Option<Self::Hit> {
        let c = (self.shader)(p);
        (c.a != 0).then_some(c)
    }
}
