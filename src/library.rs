//! Named image-sequence folders under one root directory.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{TileReelError, TileReelResult};
use crate::source::sequence::{ImageSequence, is_frame_file};

/// A sequence folder and how many frame files it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEntry {
    pub name: String,
    pub frame_count: usize,
}

#[derive(Debug, Clone)]
pub struct VideoLibrary {
    root: PathBuf,
}

impl VideoLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing.
    pub fn ensure_root(&self) -> TileReelResult<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)
                .with_context(|| format!("create videos dir '{}'", self.root.display()))?;
            tracing::info!(dir = %self.root.display(), "created videos directory");
        }
        Ok(())
    }

    /// Every sub-directory with its frame count, sorted by name. A missing root lists nothing.
    pub fn list(&self) -> TileReelResult<Vec<SequenceEntry>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("read videos dir '{}'", self.root.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("list videos dir '{}'", self.root.display()))?
                .path();
            if !path.is_dir() {
                continue;
            }
            let frame_count = std::fs::read_dir(&path)
                .map(|it| {
                    it.filter_map(Result::ok)
                        .filter(|e| e.path().is_file() && is_frame_file(&e.path()))
                        .count()
                })
                .unwrap_or(0);
            out.push(SequenceEntry {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                frame_count,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Path of the folder `name`. Only a single plain path component is accepted.
    pub fn resolve(&self, name: &str) -> TileReelResult<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(TileReelError::config(format!(
                "invalid sequence folder name '{name}'"
            ))),
        }
    }

    pub fn open(&self, name: &str, cache_frames: bool, looping: bool) -> TileReelResult<ImageSequence> {
        let dir = self.resolve(name)?;
        if !dir.is_dir() {
            return Err(TileReelError::config(format!(
                "folder '{name}' not found (expected at '{}')",
                dir.display()
            )));
        }
        ImageSequence::open(dir, cache_frames, looping)
    }
}

#[cfg(test)]
#[path = "../tests/unit/library.rs"]
mod tests;
