use crate::{
    foundation::core::{Quality, Rgba8Premul},
    render::context::PixelBuffer,
};

/// Source buffer reconstruction filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Filter {
    Nearest,
    Bilinear,
    /// Catmull-Rom over a 4x4 neighbourhood.
    Bicubic,
}

impl Filter {
    pub fn for_quality(quality: Quality) -> Self {
        match quality.0 {
            0..=4 => Self::Bicubic,
            5..=6 => Self::Bilinear,
            _ => Self::Nearest,
        }
    }

    /// Sample `buf` at continuous pixel coordinates, where integers land on pixel samples.
    ///
    /// Neighbours outside the buffer clamp to the nearest edge pixel.
    pub fn sample(self, buf: &PixelBuffer, u: f64, v: f64) -> Rgba8Premul {
        match self {
            Self::Nearest => nearest(buf, u, v),
            Self::Bilinear => bilinear(buf, u, v),
            Self::Bicubic => bicubic(buf, u, v),
        }
    }
}

fn clamp_index(i: i64, len: u32) -> u32 {
    i.clamp(0, i64::from(len) - 1) as u32
}

fn nearest(buf: &PixelBuffer, u: f64, v: f64) -> Rgba8Premul {
    let x = clamp_index((u + 0.5).floor() as i64, buf.width);
    let y = clamp_index((v + 0.5).floor() as i64, buf.height);
    buf.get(x, y)
}

fn bilinear(buf: &PixelBuffer, u: f64, v: f64) -> Rgba8Premul {
    let (fu, fv) = (u.floor(), v.floor());
    let (tx, ty) = ((u - fu) as f32, (v - fv) as f32);
    let (x0, y0) = (fu as i64, fv as i64);

    let mut acc = [0.0f32; 4];
    for (dy, wy) in [(0, 1.0 - ty), (1, ty)] {
        let y = clamp_index(y0 + dy, buf.height);
        for (dx, wx) in [(0, 1.0 - tx), (1, tx)] {
            let x = clamp_index(x0 + dx, buf.width);
            accumulate(&mut acc, buf.get(x, y), wx * wy);
        }
    }
    Rgba8Premul::from_f32_saturating(acc)
}

fn bicubic(buf: &PixelBuffer, u: f64, v: f64) -> Rgba8Premul {
    let (fu, fv) = (u.floor(), v.floor());
    let wx = catmull_rom_weights((u - fu) as f32);
    let wy = catmull_rom_weights((v - fv) as f32);
    let (x0, y0) = (fu as i64, fv as i64);

    let mut acc = [0.0f32; 4];
    for (j, wyj) in wy.iter().enumerate() {
        let y = clamp_index(y0 + j as i64 - 1, buf.height);
        for (i, wxi) in wx.iter().enumerate() {
            let x = clamp_index(x0 + i as i64 - 1, buf.width);
            accumulate(&mut acc, buf.get(x, y), wxi * wyj);
        }
    }
    Rgba8Premul::from_f32_saturating(acc)
}

fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2,
    ]
}

#[inline]
fn accumulate(acc: &mut [f32; 4], c: Rgba8Premul, w: f32) {
    for (a, ch) in acc.iter_mut().zip(c.to_array()) {
        *a += w * f32::from(ch);
    }
}
