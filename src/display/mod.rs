//! Displays: a logical pixel canvas laid over a grid of tiles, plus the viewers watching it.

pub mod tile;
pub mod viewer;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::foundation::core::{Color, Pixels};
use crate::foundation::error::{TileReelError, TileReelResult};

pub use tile::{TILE_IMAGE_SIZE, TILE_SCALE, TILE_SIZE, Tile, TileGrid};
pub use viewer::{InMemoryViewer, TileDirViewer, Viewer, ViewerId};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Tiles produced for the frame.
    pub tiles: usize,
    /// Viewers that accepted the batch.
    pub delivered: usize,
    /// Viewers whose sink returned an error.
    pub failed: usize,
}

/// A canvas of `tiles_wide x tiles_high` tiles anchored at a tile-space origin.
///
/// The viewer set may change while a broadcast is running; each broadcast works on a snapshot
/// taken when it starts.
pub struct Display {
    id: String,
    grid: TileGrid,
    viewers: RwLock<HashMap<ViewerId, Arc<dyn Viewer>>>,
    last_frame: RwLock<Option<Pixels>>,
}

impl Display {
    pub fn new(
        id: impl Into<String>,
        origin_x: i32,
        origin_z: i32,
        tiles_wide: u32,
        tiles_high: u32,
    ) -> TileReelResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TileReelError::config("display id must be non-empty"));
        }
        if tiles_wide == 0 || tiles_high == 0 {
            return Err(TileReelError::config(format!(
                "display '{id}' needs at least one tile in each direction, got {tiles_wide}x{tiles_high}"
            )));
        }
        if tiles_wide.checked_mul(TILE_SIZE).is_none() || tiles_high.checked_mul(TILE_SIZE).is_none()
        {
            return Err(TileReelError::config(format!(
                "display '{id}' tile grid {tiles_wide}x{tiles_high} is too large"
            )));
        }

        Ok(Self {
            id,
            grid: TileGrid {
                origin_x,
                origin_z,
                tiles_wide,
                tiles_high,
            },
            viewers: RwLock::new(HashMap::new()),
            last_frame: RwLock::new(None),
        })
    }

    pub fn builder() -> DisplayBuilder {
        DisplayBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    pub fn pixel_width(&self) -> u32 {
        self.grid.pixel_width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.grid.pixel_height()
    }

    pub fn total_pixels(&self) -> usize {
        self.grid.total_pixels()
    }

    /// Add a viewer. Returns `false` when a viewer with the same id is already present.
    pub fn add_viewer(&self, viewer: Arc<dyn Viewer>) -> bool {
        let mut viewers = self.viewers.write().unwrap_or_else(PoisonError::into_inner);
        let id = viewer.id();
        if viewers.contains_key(&id) {
            return false;
        }
        viewers.insert(id, viewer);
        true
    }

    pub fn remove_viewer(&self, id: &ViewerId) -> bool {
        self.viewers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn has_viewer(&self, id: &ViewerId) -> bool {
        self.viewers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Sorted viewer ids.
    pub fn viewer_ids(&self) -> Vec<ViewerId> {
        let mut ids: Vec<_> = self
            .viewers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn clear_viewers(&self) {
        self.viewers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Frame most recently passed to [`Display::broadcast`], if any.
    pub fn last_frame(&self) -> Option<Pixels> {
        self.last_frame
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tile a full frame and deliver it to every current viewer.
    ///
    /// Fails with [`TileReelError::SizeMismatch`] before any viewer I/O when the buffer does not
    /// cover the canvas exactly. A viewer whose sink fails is logged and counted; the remaining
    /// viewers still receive the frame.
    pub fn broadcast(&self, frame: &Pixels) -> TileReelResult<BroadcastReport> {
        self.check_len(frame)?;

        let viewers: Vec<Arc<dyn Viewer>> = self
            .viewers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        *self.last_frame.write().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());

        let tiles = self.grid.cut(frame);
        let mut report = BroadcastReport {
            tiles: tiles.len(),
            ..BroadcastReport::default()
        };
        for viewer in viewers {
            match viewer.send_tiles(&tiles) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        display = %self.id,
                        viewer = %viewer.id(),
                        error = %e,
                        "tile delivery failed"
                    );
                }
            }
        }
        Ok(report)
    }

    /// Tile a full frame and deliver it to one viewer only (e.g. one that just joined).
    pub fn broadcast_to(&self, viewer: &dyn Viewer, frame: &[u32]) -> TileReelResult<()> {
        self.check_len(frame)?;
        let tiles = self.grid.cut(frame);
        viewer.send_tiles(&tiles)
    }

    /// Broadcast a single solid color.
    pub fn fill(&self, color: u32) -> TileReelResult<BroadcastReport> {
        self.broadcast(&Arc::new(vec![color; self.total_pixels()]))
    }

    /// Broadcast transparent black.
    pub fn clear(&self) -> TileReelResult<BroadcastReport> {
        self.fill(Color::TRANSPARENT)
    }

    fn check_len(&self, frame: &[u32]) -> TileReelResult<()> {
        let expected = self.total_pixels();
        if frame.len() != expected {
            return Err(TileReelError::size_mismatch(expected, frame.len()));
        }
        Ok(())
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}x{} tiles at ({}, {}), {}x{}px, {} viewers",
            self.id,
            self.grid.tiles_wide,
            self.grid.tiles_high,
            self.grid.origin_x,
            self.grid.origin_z,
            self.pixel_width(),
            self.pixel_height(),
            self.viewer_count()
        )
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("id", &self.id)
            .field("grid", &self.grid)
            .field("viewers", &self.viewer_ids())
            .finish_non_exhaustive()
    }
}

/// Fluent construction of a [`Display`].
#[derive(Debug, Clone)]
pub struct DisplayBuilder {
    id: Option<String>,
    origin_x: i32,
    origin_z: i32,
    tiles_wide: u32,
    tiles_high: u32,
}

impl Default for DisplayBuilder {
    fn default() -> Self {
        Self {
            id: None,
            origin_x: 0,
            origin_z: 0,
            tiles_wide: 10,
            tiles_high: 6,
        }
    }
}

impl DisplayBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn position(mut self, origin_x: i32, origin_z: i32) -> Self {
        self.origin_x = origin_x;
        self.origin_z = origin_z;
        self
    }

    /// Size in tiles.
    pub fn size(mut self, tiles_wide: u32, tiles_high: u32) -> Self {
        self.tiles_wide = tiles_wide;
        self.tiles_high = tiles_high;
        self
    }

    /// Size in pixels, rounded up to whole tiles.
    pub fn pixel_size(mut self, width: u32, height: u32) -> Self {
        self.tiles_wide = width.div_ceil(TILE_SIZE);
        self.tiles_high = height.div_ceil(TILE_SIZE);
        self
    }

    /// Build the display. Without an explicit id, one is derived from the current time.
    pub fn build(self) -> TileReelResult<Display> {
        let id = self.id.unwrap_or_else(|| {
            let millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            format!("display_{millis}")
        });
        Display::new(
            id,
            self.origin_x,
            self.origin_z,
            self.tiles_wide,
            self.tiles_high,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/display/mod.rs"]
mod tests;
