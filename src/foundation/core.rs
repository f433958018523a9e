pub use kurbo::{CubicBez, Point, Rect, Vec2};

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }

    /// Round and saturate filtered channel values back to bytes.
    pub(crate) fn from_f32_saturating(c: [f32; 4]) -> Self {
        fn q(v: f32) -> u8 {
            if v.is_nan() {
                return 0;
            }
            v.round().clamp(0.0, 255.0) as u8
        }

        // Premultiplied color channels may never exceed alpha.
        let a = q(c[3]);
        Self {
            r: q(c[0]).min(a),
            g: q(c[1]).min(a),
            b: q(c[2]).min(a),
            a,
        }
    }
}

/// Render quality level: `0` is the highest fidelity, larger values are faster and cruder.
///
/// Drives both the closest-point search iteration count and the resampling filter.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Quality(pub u8);

impl Quality {
    pub const BEST: Self = Self(0);
    pub const DRAFT: Self = Self(10);
}

impl Default for Quality {
    fn default() -> Self {
        Self(3)
    }
}
