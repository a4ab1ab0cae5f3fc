//! Operator command surface: parse one text line into a [`Command`] and run it against a
//! registry and a video library.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clap::{Parser, Subcommand};

use crate::display::{Viewer, ViewerId};
use crate::foundation::core::Fps;
use crate::foundation::error::TileReelResult;
use crate::library::VideoLibrary;
use crate::registry::DisplayRegistry;
use crate::schedule::AnimationOpts;
use crate::source::FrameSource;
use crate::source::effect::Effect;
use crate::source::sequence::ImageSequence;

#[derive(Parser, Debug)]
#[command(name = "tilereel", no_binary_name = true, disable_version_flag = true)]
struct ControlLine {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a display of `width x height` tiles at tile origin (x, z).
    Create {
        id: String,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        z: i32,
        width: u32,
        height: u32,
    },
    /// Remove a display, stopping its animation.
    Remove { id: String },
    /// List displays.
    List,
    /// Join a display as a viewer.
    Join { id: String, viewer: String },
    /// Leave a display.
    Leave { id: String, viewer: String },
    /// Play a built-in effect.
    Demo { id: String, effect: Option<String> },
    /// Play an image sequence folder.
    Frames {
        id: String,
        folder: String,
        fps: Option<u32>,
    },
    /// Stop the animation on a display.
    Stop { id: String },
    /// Pause the animation on a display.
    Pause { id: String },
    /// Resume a paused animation.
    Resume { id: String },
    /// Jump to a frame.
    Seek {
        id: String,
        #[arg(allow_negative_numbers = true)]
        frame: i64,
    },
    /// Decode a sequence folder into memory at a display's resolution.
    Preload { id: String, folder: String },
    /// List available sequence folders.
    Videos,
}

impl Command {
    /// Parse a whitespace-separated command line (without a program name).
    pub fn parse_line(line: &str) -> Result<Self, String> {
        ControlLine::try_parse_from(line.split_whitespace())
            .map(|l| l.cmd)
            .map_err(|e| e.render().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Muted,
    Warning,
    Error,
}

/// Lines of feedback for the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<(Level, String)>,
}

impl Reply {
    fn one(level: Level, msg: impl Into<String>) -> Self {
        Self {
            lines: vec![(level, msg.into())],
        }
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::one(Level::Success, msg)
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::one(Level::Warning, msg)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::one(Level::Error, msg)
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self::one(Level::Info, msg)
    }

    fn and(mut self, level: Level, msg: impl Into<String>) -> Self {
        self.lines.push((level, msg.into()));
        self
    }

    /// Level of the first line, if any.
    pub fn level(&self) -> Option<Level> {
        self.lines.first().map(|(l, _)| *l)
    }

    pub fn is_error(&self) -> bool {
        self.level() == Some(Level::Error)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (level, line)) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match level {
                Level::Success | Level::Info => write!(f, "{line}")?,
                Level::Muted => write!(f, "  {line}")?,
                Level::Warning => write!(f, "warning: {line}")?,
                Level::Error => write!(f, "error: {line}")?,
            }
        }
        Ok(())
    }
}

/// Creates the sink for a viewer joining by name.
pub type ViewerFactory = Box<dyn Fn(&str) -> TileReelResult<Arc<dyn Viewer>> + Send + Sync>;

/// Executes operator commands.
///
/// Each display keeps at most one opened image sequence, so a `preload` warms the cache that a
/// later `frames` of the same folder plays from. Loading another folder replaces it; `stop` and
/// `remove` release it.
pub struct Controller {
    registry: Arc<DisplayRegistry>,
    library: VideoLibrary,
    viewers: ViewerFactory,
    effect_fps: Fps,
    sequence_fps: Fps,
    // display id -> (folder, sequence)
    sequences: Mutex<HashMap<String, (String, Arc<ImageSequence>)>>,
}

impl Controller {
    pub fn new(registry: Arc<DisplayRegistry>, library: VideoLibrary, viewers: ViewerFactory) -> Self {
        Self {
            registry,
            library,
            viewers,
            effect_fps: Fps::clamped(24),
            sequence_fps: Fps::clamped(30),
            sequences: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_rates(mut self, effect_fps: u32, sequence_fps: u32) -> Self {
        self.effect_fps = Fps::clamped(i64::from(effect_fps));
        self.sequence_fps = Fps::clamped(i64::from(sequence_fps));
        self
    }

    pub fn registry(&self) -> &Arc<DisplayRegistry> {
        &self.registry
    }

    pub fn handle_line(&self, line: &str) -> Reply {
        match Command::parse_line(line) {
            Ok(cmd) => self.execute(cmd),
            Err(msg) => Reply::error(msg.trim_end()),
        }
    }

    pub fn execute(&self, cmd: Command) -> Reply {
        match cmd {
            Command::Create {
                id,
                x,
                z,
                width,
                height,
            } => self.create(&id, x, z, width, height),
            Command::Remove { id } => {
                self.release_sequence(&id);
                if self.registry.remove(&id) {
                    Reply::success(format!("Removed display '{id}'"))
                } else {
                    not_found(&id)
                }
            }
            Command::List => self.list(),
            Command::Join { id, viewer } => self.join(&id, &viewer),
            Command::Leave { id, viewer } => {
                if self.registry.remove_viewer(&id, &ViewerId::new(viewer)) {
                    Reply::success(format!("Left display '{id}'"))
                } else {
                    not_found(&id)
                }
            }
            Command::Demo { id, effect } => self.demo(&id, effect.as_deref().unwrap_or("plasma")),
            Command::Frames { id, folder, fps } => self.frames(&id, &folder, fps),
            Command::Stop { id } => {
                self.release_sequence(&id);
                if self.registry.stop_animation(&id) {
                    Reply::success(format!("Stopped animation on '{id}'"))
                } else {
                    Reply::error(format!("No animation running on '{id}' or display not found"))
                }
            }
            Command::Pause { id } => {
                if self.registry.pause_animation(&id) {
                    Reply::success(format!("Paused '{id}'"))
                } else {
                    Reply::error(format!("Nothing to pause on '{id}'"))
                }
            }
            Command::Resume { id } => {
                if self.registry.resume_animation(&id) {
                    Reply::success(format!("Resumed '{id}'"))
                } else {
                    Reply::error(format!("Nothing to resume on '{id}'"))
                }
            }
            Command::Seek { id, frame } => {
                if self.registry.seek_animation(&id, frame) {
                    let at = self.registry.current_frame(&id).map(|f| f.0).unwrap_or(0);
                    Reply::success(format!("Seeked '{id}' to frame {at}"))
                } else {
                    Reply::error(format!("No animation on '{id}'"))
                }
            }
            Command::Preload { id, folder } => self.preload(&id, &folder),
            Command::Videos => self.videos(),
        }
    }

    fn create(&self, id: &str, x: i32, z: i32, width: u32, height: u32) -> Reply {
        if self.registry.exists(id) {
            return Reply::error(format!("Display '{id}' already exists"));
        }
        match self.registry.create(id, x, z, width, height) {
            Ok(d) => Reply::success(format!(
                "Created display '{id}' at ({x}, {z}) - {}x{} pixels",
                d.pixel_width(),
                d.pixel_height()
            )),
            Err(e) => Reply::error(e.to_string()),
        }
    }

    fn list(&self) -> Reply {
        let lines = self.registry.display_summaries();
        if lines.is_empty() {
            return Reply::one(Level::Muted, "No displays created.");
        }
        let header = Reply::info(format!("Displays ({}):", lines.len()));
        lines
            .into_iter()
            .fold(header, |reply, line| reply.and(Level::Muted, line))
    }

    fn join(&self, id: &str, viewer: &str) -> Reply {
        if !self.registry.exists(id) {
            return not_found(id);
        }
        let sink = match (self.viewers)(viewer) {
            Ok(sink) => sink,
            Err(e) => return Reply::error(format!("Cannot attach viewer '{viewer}': {e}")),
        };
        if self.registry.add_viewer(id, sink) {
            Reply::success(format!("'{viewer}' joined display '{id}'"))
        } else {
            not_found(id)
        }
    }

    fn demo(&self, id: &str, effect: &str) -> Reply {
        let Some(display) = self.registry.get(id) else {
            return not_found(id);
        };
        if display.viewer_count() == 0 {
            return Reply::warning(format!("No viewers on '{id}'. Join it first"));
        }
        let effect: Effect = match effect.parse() {
            Ok(e) => e,
            Err(e) => return Reply::error(e.to_string()),
        };

        let opts = AnimationOpts {
            frame_count: 0,
            fps: self.effect_fps,
            looping: true,
        };
        self.registry
            .start_animation(id, Arc::from(effect.build()), opts);
        Reply::success(format!(
            "Playing '{effect}' on display '{id}' at {} FPS",
            self.effect_fps.get()
        ))
    }

    fn frames(&self, id: &str, folder: &str, fps: Option<u32>) -> Reply {
        let Some(display) = self.registry.get(id) else {
            return not_found(id);
        };
        if display.viewer_count() == 0 {
            return Reply::warning(format!("No viewers on '{id}'. Join it first"));
        }
        let seq = match self.sequence(id, folder) {
            Ok(seq) => seq,
            Err(e) => {
                return Reply::error(format!("Failed to load frames: {e}")).and(
                    Level::Muted,
                    format!(
                        "Extract frames: ffmpeg -i video.mp4 -vf \"scale={}:{}\" {}/frame_%04d.png",
                        display.pixel_width(),
                        display.pixel_height(),
                        self.library.root().join(folder).display()
                    ),
                );
            }
        };

        let fps = fps.map_or(self.sequence_fps, |f| Fps::clamped(i64::from(f)));
        let frame_count = seq.frame_count();
        let opts = AnimationOpts {
            frame_count: frame_count as u64,
            fps,
            looping: true,
        };
        let source: Arc<dyn FrameSource> = seq;
        self.registry.start_animation(id, source, opts);
        Reply::success(format!(
            "Playing '{folder}' on '{id}' at {} FPS ({frame_count} frames)",
            fps.get()
        ))
    }

    fn preload(&self, id: &str, folder: &str) -> Reply {
        let Some(display) = self.registry.get(id) else {
            return not_found(id);
        };
        let (w, h) = (display.pixel_width(), display.pixel_height());
        match self.sequence(id, folder) {
            Ok(seq) => {
                let cached = seq.preload_all(w, h);
                Reply::success(format!("Preloaded {cached}/{} frames", seq.frame_count()))
                    .and(Level::Muted, format!("Use 'frames {id} {folder}' to play"))
            }
            Err(e) => Reply::error(format!("Failed to preload: {e}")),
        }
    }

    fn videos(&self) -> Reply {
        match self.library.list() {
            Ok(entries) if entries.is_empty() => Reply::one(
                Level::Muted,
                format!("No videos found in {}", self.library.root().display()),
            ),
            Ok(entries) => entries.into_iter().fold(
                Reply::info("Available videos:"),
                |reply, e| {
                    reply.and(
                        Level::Muted,
                        format!("[FRAMES] {} ({} frames)", e.name, e.frame_count),
                    )
                },
            ),
            Err(e) => Reply::error(e.to_string()),
        }
    }

    /// Number of displays currently holding an opened image sequence.
    pub fn cached_sequences(&self) -> usize {
        self.lock_sequences().len()
    }

    fn sequence(&self, id: &str, folder: &str) -> TileReelResult<Arc<ImageSequence>> {
        let mut sequences = self.lock_sequences();
        if let Some((open, seq)) = sequences.get(id)
            && open == folder
        {
            return Ok(seq.clone());
        }
        let seq = Arc::new(self.library.open(folder, true, true)?);
        sequences.insert(id.to_string(), (folder.to_string(), seq.clone()));
        Ok(seq)
    }

    fn release_sequence(&self, id: &str) {
        if let Some((folder, seq)) = self.lock_sequences().remove(id) {
            tracing::debug!(display = %id, folder = %folder, frames = seq.cached_frames(), "sequence released");
        }
    }

    fn lock_sequences(&self) -> MutexGuard<'_, HashMap<String, (String, Arc<ImageSequence>)>> {
        self.sequences.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("registry", &self.registry)
            .field("library", &self.library)
            .field("effect_fps", &self.effect_fps)
            .field("sequence_fps", &self.sequence_fps)
            .field("cached_sequences", &self.cached_sequences())
            .finish_non_exhaustive()
    }
}

fn not_found(id: &str) -> Reply {
    Reply::error(format!("Display '{id}' not found"))
}

#[cfg(test)]
#[path = "../tests/unit/control.rs"]
mod tests;
