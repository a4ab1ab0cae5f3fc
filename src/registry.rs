//! Identifier-keyed table of displays and their (at most one) running animation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::display::{Display, DisplayBuilder, Viewer, ViewerId};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{TileReelError, TileReelResult};
use crate::schedule::{AnimationOpts, AnimationScheduler, TickDriver, TickPool};
use crate::source::FrameSource;

/// Owns every display and routes viewer and animation commands by display id.
///
/// Invariant: an id maps to at most one scheduler, and a replaced scheduler is stopped before its
/// successor starts. Animation changes are serialized through one lock; display lookups are not
/// blocked by running ticks.
pub struct DisplayRegistry {
    driver: Arc<dyn TickDriver>,
    displays: RwLock<HashMap<String, Arc<Display>>>,
    animations: Mutex<HashMap<String, Arc<AnimationScheduler>>>,
}

impl DisplayRegistry {
    pub fn new(driver: Arc<dyn TickDriver>) -> Self {
        Self {
            driver,
            displays: RwLock::new(HashMap::new()),
            animations: Mutex::new(HashMap::new()),
        }
    }

    /// Registry backed by a fresh [`TickPool`] with `workers` threads.
    pub fn with_pool(workers: usize) -> TileReelResult<Self> {
        Ok(Self::new(Arc::new(TickPool::new(workers)?)))
    }

    /// Create and register a display. Fails when `id` is already taken.
    pub fn create(
        &self,
        id: &str,
        origin_x: i32,
        origin_z: i32,
        tiles_wide: u32,
        tiles_high: u32,
    ) -> TileReelResult<Arc<Display>> {
        self.insert(Display::new(id, origin_x, origin_z, tiles_wide, tiles_high)?)
    }

    pub fn create_with(&self, builder: DisplayBuilder) -> TileReelResult<Arc<Display>> {
        self.insert(builder.build()?)
    }

    fn insert(&self, display: Display) -> TileReelResult<Arc<Display>> {
        let mut displays = self.displays.write().unwrap_or_else(PoisonError::into_inner);
        if displays.contains_key(display.id()) {
            return Err(TileReelError::config(format!(
                "display '{}' already exists",
                display.id()
            )));
        }
        let created = Arc::new(display);
        displays.insert(created.id().to_string(), created.clone());
        tracing::info!(id = %created.id(), grid = ?created.grid(), "display created");
        Ok(created)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Display>> {
        self.displays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Every display, sorted by id.
    pub fn all(&self) -> Vec<Arc<Display>> {
        let mut all: Vec<_> = self
            .displays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// One line per display, sorted by id, flagged when an animation is playing.
    pub fn display_summaries(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .map(|d| {
                if self.is_animating(d.id()) {
                    format!("{d} [PLAYING]")
                } else {
                    d.to_string()
                }
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.displays.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.displays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Stop any animation on `id`, then drop the display. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        // Lock order: animations, then displays.
        let mut animations = self.lock_animations();
        if let Some(scheduler) = animations.remove(id) {
            scheduler.stop();
        }
        let removed = self
            .displays
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        drop(animations);

        if removed {
            tracing::info!(display = %id, "display removed");
        }
        removed
    }

    /// Stop every animation, then drop every display.
    pub fn remove_all(&self) {
        let mut animations = self.lock_animations();
        for (_, scheduler) in animations.drain() {
            scheduler.stop();
        }
        self.displays
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Replace whatever animation runs on `id` with a new one. Returns `false` for unknown ids.
    #[tracing::instrument(skip(self, source), fields(display = %id))]
    pub fn start_animation(
        &self,
        id: &str,
        source: Arc<dyn FrameSource>,
        opts: AnimationOpts,
    ) -> bool {
        let mut animations = self.lock_animations();
        let Some(display) = self.get(id) else {
            return false;
        };
        if let Some(previous) = animations.remove(id) {
            previous.stop();
        }
        let scheduler = AnimationScheduler::new(display, source, opts, self.driver.clone());
        animations.insert(id.to_string(), scheduler.clone());
        scheduler.start();

        tracing::info!(
            fps = opts.fps.get(),
            frame_count = opts.frame_count,
            looping = opts.looping,
            "animation started"
        );
        true
    }

    /// Stop and forget the animation on `id`. Returns whether one was registered.
    pub fn stop_animation(&self, id: &str) -> bool {
        let scheduler = self.lock_animations().remove(id);
        match scheduler {
            Some(s) => {
                s.stop();
                true
            }
            None => false,
        }
    }

    pub fn pause_animation(&self, id: &str) -> bool {
        self.scheduler(id).is_some_and(|s| s.pause())
    }

    pub fn resume_animation(&self, id: &str) -> bool {
        self.scheduler(id).is_some_and(|s| s.resume())
    }

    /// Seek the animation on `id`. Returns `false` when none is registered.
    pub fn seek_animation(&self, id: &str, frame: i64) -> bool {
        match self.scheduler(id) {
            Some(s) => {
                s.seek_to(frame);
                true
            }
            None => false,
        }
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.scheduler(id).is_some_and(|s| s.is_running())
    }

    pub fn is_paused(&self, id: &str) -> bool {
        self.scheduler(id).is_some_and(|s| s.is_paused())
    }

    pub fn current_frame(&self, id: &str) -> Option<FrameIndex> {
        self.scheduler(id).map(|s| s.frame())
    }

    pub fn scheduler(&self, id: &str) -> Option<Arc<AnimationScheduler>> {
        self.lock_animations().get(id).cloned()
    }

    pub fn stop_all(&self) {
        let drained: Vec<_> = self.lock_animations().drain().collect();
        for (_, scheduler) in &drained {
            scheduler.stop();
        }
        if !drained.is_empty() {
            tracing::info!(stopped = drained.len(), "all animations stopped");
        }
    }

    /// Add a viewer to `id`. A newly added viewer immediately receives the display's last frame.
    ///
    /// Returns `false` when the display does not exist.
    pub fn add_viewer(&self, id: &str, viewer: Arc<dyn Viewer>) -> bool {
        let Some(display) = self.get(id) else {
            return false;
        };
        if display.add_viewer(viewer.clone())
            && let Some(frame) = display.last_frame()
            && let Err(e) = display.broadcast_to(viewer.as_ref(), &frame)
        {
            tracing::warn!(display = %id, viewer = %viewer.id(), error = %e, "initial frame delivery failed");
        }
        true
    }

    /// Returns `false` when the display does not exist.
    pub fn remove_viewer(&self, id: &str, viewer: &ViewerId) -> bool {
        match self.get(id) {
            Some(display) => {
                display.remove_viewer(viewer);
                true
            }
            None => false,
        }
    }

    pub fn remove_viewer_from_all(&self, viewer: &ViewerId) {
        for display in self.all() {
            display.remove_viewer(viewer);
        }
    }

    fn lock_animations(&self) -> MutexGuard<'_, HashMap<String, Arc<AnimationScheduler>>> {
        self.animations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DisplayRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl std::fmt::Debug for DisplayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayRegistry")
            .field("displays", &self.count())
            .field("animations", &self.lock_animations().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/registry.rs"]
mod tests;
