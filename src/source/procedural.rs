//! Procedural frame generators.
//!
//! Every generator except [`Noise`] and [`BouncingBall`] is a pure function of
//! `(frame, width, height)`. Rows are filled in parallel with `rayon`.

use std::f32::consts::PI;
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::foundation::core::{Color, FrameIndex, Pixels};
use crate::foundation::error::TileReelResult;
use crate::source::FrameSource;

/// Fill a `width * height` buffer row by row from a per-pixel closure.
pub(crate) fn render_pixels<F>(width: u32, height: u32, f: F) -> Pixels
where
    F: Fn(u32, u32) -> u32 + Sync,
{
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![0u32; w * h];
    if w == 0 || h == 0 {
        return Arc::new(out);
    }
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            *px = f(x as u32, y as u32);
        }
    });
    Arc::new(out)
}

/// Every pixel set to one color.
#[derive(Debug, Clone, Copy)]
pub struct Solid {
    pub color: u32,
}

impl FrameSource for Solid {
    fn get_frame(
        &self,
        _frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let len = width as usize * height as usize;
        Ok(Some(Arc::new(vec![self.color; len])))
    }
}

/// Whole-canvas hue rotation: `hue = (frame * speed) mod 360` at full saturation and value.
#[derive(Debug, Clone, Copy)]
pub struct ColorCycle {
    pub speed: f32,
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self { speed: 0.1 }
    }
}

impl ColorCycle {
    pub fn hue_at(&self, frame: FrameIndex) -> f32 {
        ((frame.0 as f64 * f64::from(self.speed)) % 360.0) as f32
    }
}

impl FrameSource for ColorCycle {
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let color = Color::from_hsv(self.hue_at(frame), 1.0, 1.0);
        Solid { color }.get_frame(frame, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientAxis {
    Horizontal,
    Vertical,
}

/// Linear two-color gradient (alpha included) along one axis.
///
/// The interpolation parameter is `x / width` (or `y / height`), so the far edge stops one step
/// short of `to`.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    pub from: u32,
    pub to: u32,
    pub axis: GradientAxis,
}

impl Gradient {
    pub fn horizontal(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            axis: GradientAxis::Horizontal,
        }
    }

    pub fn vertical(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            axis: GradientAxis::Vertical,
        }
    }
}

impl FrameSource for Gradient {
    fn get_frame(
        &self,
        _frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let (from, to, axis) = (self.from, self.to, self.axis);
        Ok(Some(render_pixels(width, height, move |x, y| {
            let t = match axis {
                GradientAxis::Horizontal => x as f32 / width as f32,
                GradientAxis::Vertical => y as f32 / height as f32,
            };
            Color::lerp(from, to, t)
        })))
    }
}

/// Classic three-term sine plasma mapped onto the hue wheel.
#[derive(Debug, Clone, Copy)]
pub struct Plasma {
    pub speed: f32,
}

impl Default for Plasma {
    fn default() -> Self {
        Self { speed: 0.05 }
    }
}

impl Plasma {
    /// Hue in degrees for normalized coordinates `(fx, fy)` at `time = frame * speed`.
    pub fn hue(fx: f32, fy: f32, time: f32) -> f32 {
        let v1 = (fx * 10.0 + time).sin();
        let v2 = (10.0 * (fx * (time / 2.0).sin() + fy * (time / 3.0).cos()) + time).sin();
        let v3 = (((fx - 0.5) * (fx - 0.5) + (fy - 0.5) * (fy - 0.5)).sqrt() * 10.0 + time).sin();
        let v = (v1 + v2 + v3) / 3.0;
        (v + 1.0) * 180.0
    }
}

impl FrameSource for Plasma {
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        // Keep the phase bounded so f32 precision holds up on long runs.
        let time = ((frame.0 as f64 * f64::from(self.speed)) % (12.0 * f64::from(PI))) as f32;
        Ok(Some(render_pixels(width, height, move |x, y| {
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            Color::from_hsv(Self::hue(fx, fy, time), 1.0, 1.0)
        })))
    }
}

/// Static checkerboard of `square_size` pixel squares; the top-left square uses `a`.
#[derive(Debug, Clone, Copy)]
pub struct Checkerboard {
    pub a: u32,
    pub b: u32,
    pub square_size: u32,
}

impl Default for Checkerboard {
    fn default() -> Self {
        Self {
            a: Color::BLACK,
            b: Color::WHITE,
            square_size: 4,
        }
    }
}

impl FrameSource for Checkerboard {
    fn get_frame(
        &self,
        _frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let Self { a, b, square_size } = *self;
        let size = square_size.max(1);
        Ok(Some(render_pixels(width, height, move |x, y| {
            if (x / size + y / size) % 2 == 0 { a } else { b }
        })))
    }
}

/// Vertical two-color stripes scrolling horizontally.
///
/// `phase = (frame * speed) mod (2 * stripe_width)`; a pixel at `x` uses `a` when
/// `(x + phase) mod (2 * stripe_width) < stripe_width`.
#[derive(Debug, Clone, Copy)]
pub struct Stripes {
    pub a: u32,
    pub b: u32,
    pub stripe_width: u32,
    pub speed: u32,
}

impl Default for Stripes {
    fn default() -> Self {
        Self {
            a: Color::RED,
            b: Color::BLUE,
            stripe_width: 8,
            speed: 1,
        }
    }
}

impl Stripes {
    pub fn phase(&self, frame: FrameIndex) -> u64 {
        let period = u64::from(self.stripe_width.max(1)) * 2;
        frame.0.wrapping_mul(u64::from(self.speed)) % period
    }
}

impl FrameSource for Stripes {
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let stripe = u64::from(self.stripe_width.max(1));
        let period = stripe * 2;
        let phase = self.phase(frame);
        let (a, b) = (self.a, self.b);
        Ok(Some(render_pixels(width, height, move |x, _| {
            if (u64::from(x) + phase) % period < stripe { a } else { b }
        })))
    }
}

/// Uniform random grayscale static.
///
/// Not deterministic: every call draws fresh values, even for the same frame index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noise;

impl FrameSource for Noise {
    fn get_frame(
        &self,
        _frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        Ok(Some(render_pixels(width, height, |_, _| {
            let gray = fastrand::u8(0..255);
            Color::rgb(gray, gray, gray)
        })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Default for BallState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 2.0,
            vy: 1.5,
        }
    }
}

impl BallState {
    /// Move by one velocity step, reflect on wall contact, then clamp inside the walls.
    pub fn advance(&mut self, radius: f64, width: f64, height: f64) {
        self.x += self.vx;
        self.y += self.vy;

        if self.x <= radius || self.x >= width - radius {
            self.vx = -self.vx;
        }
        if self.y <= radius || self.y >= height - radius {
            self.vy = -self.vy;
        }

        self.x = self.x.clamp(radius, (width - radius).max(radius));
        self.y = self.y.clamp(radius, (height - radius).max(radius));
    }
}

/// A filled circle bouncing around the canvas.
///
/// Stateful: each `get_frame` call advances the simulation one step, independent of the frame
/// index. The state sits behind a mutex so one instance can be shared, but concurrent callers
/// each consume a step.
#[derive(Debug)]
pub struct BouncingBall {
    pub ball: u32,
    pub background: u32,
    pub radius: u32,
    state: Mutex<BallState>,
}

impl Default for BouncingBall {
    fn default() -> Self {
        Self::new(Color::RED, Color::BLACK, 5)
    }
}

impl BouncingBall {
    pub fn new(ball: u32, background: u32, radius: u32) -> Self {
        Self {
            ball,
            background,
            radius,
            state: Mutex::new(BallState::default()),
        }
    }

    pub fn state(&self) -> BallState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSource for BouncingBall {
    fn get_frame(
        &self,
        _frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let r = f64::from(self.radius);
        let pos = {
            let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            st.advance(r, f64::from(width), f64::from(height));
            *st
        };

        let (ball, background) = (self.ball, self.background);
        Ok(Some(render_pixels(width, height, move |x, y| {
            let dx = f64::from(x) - pos.x;
            let dy = f64::from(y) - pos.y;
            if (dx * dx + dy * dy).sqrt() <= r {
                ball
            } else {
                background
            }
        })))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/procedural.rs"]
mod tests;
