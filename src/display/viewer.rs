use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;

use crate::display::tile::Tile;
use crate::foundation::error::{TileReelError, TileReelResult};
use crate::source::codec::write_png;

/// Identity of a viewer. Membership sets are keyed on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewerId(pub String);

impl ViewerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote consumer of tile updates.
///
/// `send_tiles` receives one whole frame as a single batch. Delivery is fire-and-forget from the
/// display's point of view: retries and backpressure belong to the sink.
pub trait Viewer: Send + Sync {
    fn id(&self) -> ViewerId;
    fn send_tiles(&self, tiles: &[Tile]) -> TileReelResult<()>;
}

/// Viewer that keeps every batch it receives. Useful for tests and debugging.
#[derive(Debug)]
pub struct InMemoryViewer {
    id: ViewerId,
    batches: Mutex<Vec<Vec<Tile>>>,
}

impl InMemoryViewer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ViewerId::new(id),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batch_count(&self) -> usize {
        self.lock().len()
    }

    /// Total tiles received across all batches.
    pub fn tile_count(&self) -> usize {
        self.lock().iter().map(Vec::len).sum()
    }

    pub fn last_batch(&self) -> Option<Vec<Tile>> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Tile>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Viewer for InMemoryViewer {
    fn id(&self) -> ViewerId {
        self.id.clone()
    }

    fn send_tiles(&self, tiles: &[Tile]) -> TileReelResult<()> {
        self.lock().push(tiles.to_vec());
        Ok(())
    }
}

/// Viewer that writes each received tile to `<dir>/tile_<x>_<z>.png`, overwriting the previous
/// frame's tile at the same coordinates.
#[derive(Debug)]
pub struct TileDirViewer {
    id: ViewerId,
    dir: PathBuf,
}

impl TileDirViewer {
    pub fn new(id: impl Into<String>, dir: impl Into<PathBuf>) -> TileReelResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create viewer dir '{}'", dir.display()))?;
        Ok(Self {
            id: ViewerId::new(id),
            dir,
        })
    }

    /// Sink for viewer `name` in its own directory directly below `root`.
    ///
    /// `name` must be a single plain path component, so a viewer can never write outside `root`.
    pub fn under(root: &Path, name: &str) -> TileReelResult<Self> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Self::new(name, root.join(name)),
            _ => Err(TileReelError::config(format!("invalid viewer name '{name}'"))),
        }
    }

    pub fn tile_path(&self, tile_x: i32, tile_z: i32) -> PathBuf {
        self.dir.join(format!("tile_{tile_x}_{tile_z}.png"))
    }
}

impl Viewer for TileDirViewer {
    fn id(&self) -> ViewerId {
        self.id.clone()
    }

    fn send_tiles(&self, tiles: &[Tile]) -> TileReelResult<()> {
        for tile in tiles {
            let path = self.tile_path(tile.tile_x, tile.tile_z);
            write_png(&path, &tile.pixels, tile.width, tile.height).map_err(|e| {
                TileReelError::delivery(format!("viewer '{}' at '{}': {e}", self.id, path.display()))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/display/viewer.rs"]
mod tests;
