//! Frame sources: "what pixels are at frame N", independent of how they get delivered.
//!
//! A [`FrameSource`] is polled by the animation scheduler once per tick with the display's exact
//! pixel dimensions. Returning `Ok(None)` means "no frame for this index" and is not an error;
//! the tick simply skips the broadcast.

pub mod codec;
pub mod effect;
pub mod procedural;
pub mod sequence;

use crate::foundation::core::{FrameIndex, Pixels};
use crate::foundation::error::TileReelResult;

/// Produces a pixel buffer for a frame index at a requested resolution.
///
/// Contract:
/// - the returned buffer, when present, should hold `width * height` pixels (the scheduler drops
///   buffers of any other length without broadcasting them);
/// - out-of-range indices never error: sources either wrap them or return `Ok(None)`;
/// - implementations are called from shared timer workers and must be `Send + Sync`.
pub trait FrameSource: Send + Sync {
    fn get_frame(&self, frame: FrameIndex, width: u32, height: u32)
    -> TileReelResult<Option<Pixels>>;
}

impl<T: FrameSource + ?Sized> FrameSource for std::sync::Arc<T> {
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        (**self).get_frame(frame, width, height)
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        (**self).get_frame(frame, width, height)
    }
}

/// Adapts a plain closure into a [`FrameSource`].
pub struct FnSource<F>(pub F);

impl<F> FrameSource for FnSource<F>
where
    F: Fn(FrameIndex, u32, u32) -> Option<Pixels> + Send + Sync,
{
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        Ok((self.0)(frame, width, height))
    }
}

impl<F> std::fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnSource(..)")
    }
}

/// Pre-rendered frames played back by index modulo their count.
///
/// Frames are returned as-is regardless of the requested resolution.
#[derive(Debug, Clone, Default)]
pub struct FrameList {
    frames: Vec<Pixels>,
}

impl FrameList {
    pub fn new(frames: Vec<Pixels>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FrameList {
    fn get_frame(
        &self,
        frame: FrameIndex,
        _width: u32,
        _height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        let idx = (frame.0 % self.frames.len() as u64) as usize;
        Ok(Some(self.frames[idx].clone()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/mod.rs"]
mod tests;
