use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::display::{BroadcastReport, Display};
use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::TileReelResult;
use crate::schedule::{TickDriver, TickHandle};
use crate::source::FrameSource;

/// Playback policy for one animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationOpts {
    /// Number of frames in the sequence; `0` means unbounded (no wrap, no stop).
    pub frame_count: u64,
    pub fps: Fps,
    /// Wrap to frame 0 after the last frame instead of stopping.
    pub looping: bool,
}

impl Default for AnimationOpts {
    fn default() -> Self {
        Self {
            frame_count: 0,
            fps: Fps::default(),
            looping: true,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or paused.
    Inactive,
    /// The display has no viewers; the source was not consulted.
    NoViewers,
    /// The source had nothing (or a wrongly sized buffer) for this index.
    NoFrame,
    Broadcast(BroadcastReport),
    /// Frame production or delivery failed; the index was not advanced.
    Failed,
}

/// Playback position. `epoch` is bumped by every `stop` and `seek_to`, so a tick can tell that its
/// frame was overridden even when the new value equals the one it rendered.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    frame: u64,
    epoch: u64,
}

/// Drives one display from one frame source at a fixed rate.
///
/// All control operations are safe to call from any thread while a tick is running; none of them
/// waits for frame production. `stop` cancels future ticks but does not interrupt one already executing, so at most
/// one more broadcast may land after it returns.
pub struct AnimationScheduler {
    display: Arc<Display>,
    source: Arc<dyn FrameSource>,
    opts: AnimationOpts,
    driver: Arc<dyn TickDriver>,
    cursor: Mutex<Cursor>,
    running: AtomicBool,
    paused: AtomicBool,
    // Held across start/stop so a start racing a stop never leaves an orphaned schedule.
    task: Mutex<Option<TickHandle>>,
}

impl AnimationScheduler {
    pub fn new(
        display: Arc<Display>,
        source: Arc<dyn FrameSource>,
        opts: AnimationOpts,
        driver: Arc<dyn TickDriver>,
    ) -> Arc<Self> {
        Arc::new(Self {
            display,
            source,
            opts,
            driver,
            cursor: Mutex::new(Cursor::default()),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            task: Mutex::new(None),
        })
    }

    pub fn display(&self) -> &Arc<Display> {
        &self.display
    }

    pub fn opts(&self) -> AnimationOpts {
        self.opts
    }

    pub fn interval(&self) -> Duration {
        self.opts.fps.tick_interval()
    }

    pub fn frame(&self) -> FrameIndex {
        FrameIndex(self.lock_cursor().frame)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Begin ticking at the configured rate, first tick immediately. No-op when already running.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.lock_task();
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let weak = Arc::downgrade(self);
        let handle = self.driver.schedule_fixed_rate(
            Duration::ZERO,
            self.interval(),
            Arc::new(move || {
                if let Some(scheduler) = weak.upgrade() {
                    scheduler.tick();
                }
            }),
        );
        if let Some(stale) = task.replace(handle) {
            stale.cancel();
        }

        tracing::debug!(
            display = %self.display.id(),
            fps = self.opts.fps.get(),
            frame_count = self.opts.frame_count,
            looping = self.opts.looping,
            "animation started"
        );
    }

    /// Cancel future ticks and rewind to frame 0. Idempotent.
    pub fn stop(&self) {
        let mut task = self.lock_task();
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.paused.store(false, Ordering::Release);
        if let Some(handle) = task.take() {
            handle.cancel();
        }
        self.reposition(0);

        if was_running {
            tracing::debug!(display = %self.display.id(), "animation stopped");
        }
    }

    /// Suppress rendering while keeping the timer alive. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.is_running()
            && self
                .paused
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    pub fn resume(&self) -> bool {
        self.is_running()
            && self
                .paused
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// Jump to `frame` on the next tick, clamped to `[0, frame_count - 1]` for bounded
    /// sequences and to `>= 0` otherwise.
    pub fn seek_to(&self, frame: i64) {
        let lo = frame.max(0) as u64;
        let target = match self.opts.frame_count {
            0 => lo,
            n => lo.min(n - 1),
        };
        self.reposition(target);
    }

    fn reposition(&self, frame: u64) {
        let mut cursor = self.lock_cursor();
        cursor.frame = frame;
        cursor.epoch = cursor.epoch.wrapping_add(1);
    }

    /// One timer firing. Errors are logged and never stop the animation.
    pub fn tick(&self) -> TickOutcome {
        if !self.is_running() || self.is_paused() {
            return TickOutcome::Inactive;
        }
        if self.display.viewer_count() == 0 {
            return TickOutcome::NoViewers;
        }

        let Cursor { frame, epoch } = *self.lock_cursor();
        let frame = FrameIndex(frame);
        match self.render(frame) {
            Ok(outcome) => {
                self.advance(frame, epoch);
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    display = %self.display.id(),
                    frame = frame.0,
                    error = %e,
                    "animation tick failed"
                );
                TickOutcome::Failed
            }
        }
    }

    fn render(&self, frame: FrameIndex) -> TileReelResult<TickOutcome> {
        let (w, h) = (self.display.pixel_width(), self.display.pixel_height());
        let Some(pixels) = self.source.get_frame(frame, w, h)? else {
            return Ok(TickOutcome::NoFrame);
        };
        if pixels.len() != self.display.total_pixels() {
            tracing::debug!(
                display = %self.display.id(),
                frame = frame.0,
                len = pixels.len(),
                "dropping wrongly sized frame"
            );
            return Ok(TickOutcome::NoFrame);
        }
        Ok(TickOutcome::Broadcast(self.display.broadcast(&pixels)?))
    }

    // A seek or stop that landed during the tick wins over the tick's own advance.
    fn advance(&self, frame: FrameIndex, epoch: u64) {
        let next = frame.0.saturating_add(1);
        let count = self.opts.frame_count;
        let finished = {
            let mut cursor = self.lock_cursor();
            if cursor.epoch != epoch {
                return;
            }
            if count > 0 && next >= count {
                cursor.frame = 0;
                !self.opts.looping
            } else {
                cursor.frame = next;
                false
            }
        };
        // Taken outside the cursor lock: `stop` locks the task before the cursor.
        if finished {
            self.stop();
        }
    }

    fn lock_cursor(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<TickHandle>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_task().take() {
            handle.cancel();
        }
    }
}

impl std::fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("display", &self.display.id())
            .field("opts", &self.opts)
            .field("frame", &self.frame())
            .field("running", &self.is_running())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
