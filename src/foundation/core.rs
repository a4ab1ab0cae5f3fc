use std::sync::Arc;
use std::time::Duration;

/// Shared, immutable pixel buffer in row-major order, one packed ARGB value per pixel.
///
/// Sources that cache frames hand out clones of the same `Arc`, so repeated playback of a
/// cached frame never copies pixels.
pub type Pixels = Arc<Vec<u32>>;

/// Absolute 0-based frame index in playback order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Index as `usize`, saturating on narrow targets.
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

/// Playback rate in whole frames per second, clamped to `[Fps::MIN, Fps::MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fps(u32);

impl Fps {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 60;

    /// Clamp any requested rate into the supported range.
    pub fn clamped(fps: i64) -> Self {
        Self(fps.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Timer period for this rate: `1000ms / fps` using integer division.
    pub fn tick_interval(self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.0))
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self(24)
    }
}

/// Packed `0xAARRGGBB` color helpers.
pub struct Color;

impl Color {
    pub const TRANSPARENT: u32 = 0x0000_0000;
    pub const BLACK: u32 = 0xFF00_0000;
    pub const WHITE: u32 = 0xFFFF_FFFF;
    pub const RED: u32 = 0xFFFF_0000;
    pub const GREEN: u32 = 0xFF00_FF00;
    pub const BLUE: u32 = 0xFF00_00FF;

    /// Opaque color from 8-bit channels.
    pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
        Self::rgba(r, g, b, 0xFF)
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    pub fn alpha(c: u32) -> u8 {
        (c >> 24) as u8
    }

    pub fn red(c: u32) -> u8 {
        (c >> 16) as u8
    }

    pub fn green(c: u32) -> u8 {
        (c >> 8) as u8
    }

    pub fn blue(c: u32) -> u8 {
        c as u8
    }

    /// Per-channel linear interpolation (alpha included); `t` is clamped to `[0, 1]`.
    pub fn lerp(c1: u32, c2: u32, t: f32) -> u32 {
        fn mix(a: u8, b: u8, t: f32) -> u8 {
            let a = f32::from(a);
            let b = f32::from(b);
            (a + (b - a) * t) as u8
        }

        let t = t.clamp(0.0, 1.0);
        Self::rgba(
            mix(Self::red(c1), Self::red(c2), t),
            mix(Self::green(c1), Self::green(c2), t),
            mix(Self::blue(c1), Self::blue(c2), t),
            mix(Self::alpha(c1), Self::alpha(c2), t),
        )
    }

    /// HSV to opaque RGB. `h` is in degrees, `s` and `v` in `[0, 1]`.
    pub fn from_hsv(h: f32, s: f32, v: f32) -> u32 {
        let h = h.rem_euclid(360.0);
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r1, g1, b1) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        let to_u8 = |f: f32| ((f + m) * 255.0).clamp(0.0, 255.0) as u8;
        Self::rgb(to_u8(r1), to_u8(g1), to_u8(b1))
    }

    /// Convert straight-alpha RGBA8 bytes into one packed pixel.
    pub fn from_rgba8(px: [u8; 4]) -> u32 {
        Self::rgba(px[0], px[1], px[2], px[3])
    }

    /// Unpack into straight-alpha RGBA8 bytes.
    pub fn to_rgba8(c: u32) -> [u8; 4] {
        [Self::red(c), Self::green(c), Self::blue(c), Self::alpha(c)]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
