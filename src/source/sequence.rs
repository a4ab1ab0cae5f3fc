//! Image-sequence frames decoded from a directory of numbered files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use rayon::prelude::*;

use crate::foundation::core::{FrameIndex, Pixels};
use crate::foundation::error::{TileReelError, TileReelResult};
use crate::source::FrameSource;
use crate::source::codec::decode_file_scaled;

/// File extensions (lowercase) accepted as frames.
pub const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const PRELOAD_LOG_EVERY: usize = 100;

/// Return `true` when `path` has one of [`FRAME_EXTENSIONS`] (case-insensitive).
pub fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Sort key embedded in a frame file name: the first run of ASCII digits.
///
/// Names without digits (or with a run too large for `u64`) sort as `0`.
pub fn frame_number(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Eligible frame files in `dir`, ordered by [`frame_number`] then by file name.
pub fn list_frame_files(dir: &Path) -> TileReelResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("read frame directory '{}'", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list frame directory '{}'", dir.display()))?
            .path();
        if path.is_file() && is_frame_file(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|p| {
        let name = p
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (frame_number(&name), name)
    });
    Ok(files)
}

/// Return `true` when `dir` is a directory holding at least one frame file.
pub fn is_valid_frame_directory(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|e| e.path().is_file() && is_frame_file(&e.path()))
        })
        .unwrap_or(false)
}

/// Frames decoded on demand from an ordered list of image files.
///
/// Decoded frames are cached by resolved index when caching is enabled. The cache never evicts,
/// and an entry keeps the resolution it was first decoded at: asking for the same index at a
/// different size returns the originally cached buffer.
#[derive(Debug)]
pub struct ImageSequence {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cache_frames: bool,
    looping: bool,
    cache: RwLock<HashMap<usize, Pixels>>,
}

impl ImageSequence {
    /// Scan `dir` for frames. Fails with a configuration error when none are found.
    pub fn open(dir: impl Into<PathBuf>, cache_frames: bool, looping: bool) -> TileReelResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TileReelError::config(format!(
                "frame directory '{}' does not exist",
                dir.display()
            )));
        }
        let files = list_frame_files(&dir)?;
        if files.is_empty() {
            return Err(TileReelError::config(format!(
                "no image files found in '{}'",
                dir.display()
            )));
        }

        tracing::info!(dir = %dir.display(), frames = files.len(), "loaded image sequence");
        Ok(Self {
            dir,
            files,
            cache_frames,
            looping,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn cached_frames(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Map a playback index onto a file index: modulo the length when looping, `None` past the
    /// end otherwise.
    pub fn resolve(&self, frame: FrameIndex) -> Option<usize> {
        let n = self.files.len();
        if n == 0 {
            return None;
        }
        let idx = frame.as_usize();
        if self.looping {
            Some((frame.0 % n as u64) as usize)
        } else if idx >= n {
            None
        } else {
            Some(idx)
        }
    }

    /// Decode every frame at `width x height` into the cache, in parallel.
    ///
    /// Already cached frames are left untouched. Returns the number of frames cached afterwards.
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn preload_all(&self, width: u32, height: u32) -> usize {
        let total = self.files.len();
        tracing::info!(frames = total, "preloading frames");

        let done = AtomicUsize::new(0);
        (0..total).into_par_iter().for_each(|idx| {
            if self.cached(idx).is_none()
                && let Some(pixels) = self.load(idx, width, height)
            {
                self.store(idx, pixels);
            }
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % PRELOAD_LOG_EVERY == 0 {
                tracing::info!(done = n, total, "preload progress");
            }
        });

        let cached = self.cached_frames();
        tracing::info!(cached, total, "preload complete");
        cached
    }

    fn cached(&self, idx: usize) -> Option<Pixels> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&idx)
            .cloned()
    }

    fn store(&self, idx: usize, pixels: Pixels) -> Pixels {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.entry(idx).or_insert(pixels).clone()
    }

    fn load(&self, idx: usize, width: u32, height: u32) -> Option<Pixels> {
        let path = &self.files[idx];
        match decode_file_scaled(path, width, height) {
            Ok(pixels) => Some(Arc::new(pixels)),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to load frame");
                None
            }
        }
    }
}

impl FrameSource for ImageSequence {
    fn get_frame(
        &self,
        frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> TileReelResult<Option<Pixels>> {
        let Some(idx) = self.resolve(frame) else {
            return Ok(None);
        };

        if let Some(hit) = self.cached(idx) {
            return Ok(Some(hit));
        }

        let Some(pixels) = self.load(idx, width, height) else {
            return Ok(None);
        };

        if self.cache_frames {
            Ok(Some(self.store(idx, pixels)))
        } else {
            Ok(Some(pixels))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/sequence.rs"]
mod tests;
