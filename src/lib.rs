//! Tilereel plays frame sequences on large tiled displays.
//!
//! A [`Display`] is a pixel canvas laid over a grid of fixed-size tiles. Every frame a
//! [`FrameSource`] produces is cut into upscaled tiles and sent to each [`Viewer`] watching that
//! display. An [`AnimationScheduler`] drives one display at a fixed rate on a shared
//! [`TickPool`], and a [`DisplayRegistry`] owns every display plus its running animation.
//!
//! - Register displays in a [`DisplayRegistry`]
//! - Attach viewers
//! - Start an animation from a built-in [`Effect`] or an [`ImageSequence`] folder
#![forbid(unsafe_code)]

mod foundation;

/// Process configuration.
pub mod config;
/// Line-oriented operator commands.
pub mod control;
/// Displays, tiles and viewers.
pub mod display;
/// Named image-sequence folders.
pub mod library;
/// Display and animation registry.
pub mod registry;
/// Fixed-rate scheduling.
pub mod schedule;
/// Frame sources.
pub mod source;

pub use crate::foundation::core::{Color, FrameIndex, Fps, Pixels};
pub use crate::foundation::error::{TileReelError, TileReelResult};

pub use crate::config::{DisplaySpec, ReelConfig};
pub use crate::control::{Command, Controller, Level, Reply, ViewerFactory};
pub use crate::display::{
    BroadcastReport, Display, DisplayBuilder, InMemoryViewer, TILE_IMAGE_SIZE, TILE_SCALE,
    TILE_SIZE, Tile, TileDirViewer, TileGrid, Viewer, ViewerId,
};
pub use crate::library::{SequenceEntry, VideoLibrary};
pub use crate::registry::DisplayRegistry;
pub use crate::schedule::{
    AnimationOpts, AnimationScheduler, ManualTicker, TickDriver, TickHandle, TickOutcome,
    TickPool, TickTask,
};
pub use crate::source::effect::Effect;
pub use crate::source::sequence::ImageSequence;
pub use crate::source::{FnSource, FrameList, FrameSource};
