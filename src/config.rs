use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{TileReelError, TileReelResult};
use crate::registry::DisplayRegistry;

/// A display declared up front in the config file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DisplaySpec {
    pub id: String,
    #[serde(default)]
    pub origin_x: i32,
    #[serde(default)]
    pub origin_z: i32,
    pub tiles_wide: u32,
    pub tiles_high: u32,
}

/// Process configuration, loaded from JSON. Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReelConfig {
    /// Root directory holding one sub-directory per image sequence.
    pub videos_dir: PathBuf,
    /// Root directory for directory-backed viewers.
    pub output_dir: PathBuf,
    /// Worker threads in the shared tick pool.
    pub tick_workers: usize,
    /// Default rate for built-in effects.
    pub effect_fps: u32,
    /// Default rate for image sequences.
    pub sequence_fps: u32,
    pub displays: Vec<DisplaySpec>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("videos"),
            output_dir: PathBuf::from("out"),
            tick_workers: 2,
            effect_fps: 24,
            sequence_fps: 30,
            displays: Vec::new(),
        }
    }
}

impl ReelConfig {
    pub fn load(path: &Path) -> TileReelResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(json: &str) -> TileReelResult<Self> {
        let cfg: Self = serde_json::from_str(json).context("parse config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> TileReelResult<()> {
        if self.tick_workers == 0 {
            return Err(TileReelError::config("tick_workers must be >= 1"));
        }
        for (name, fps) in [
            ("effect_fps", self.effect_fps),
            ("sequence_fps", self.sequence_fps),
        ] {
            if fps == 0 {
                return Err(TileReelError::config(format!("{name} must be >= 1")));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for d in &self.displays {
            if d.tiles_wide == 0 || d.tiles_high == 0 {
                return Err(TileReelError::config(format!(
                    "display '{}' needs at least one tile in each direction",
                    d.id
                )));
            }
            if !seen.insert(d.id.as_str()) {
                return Err(TileReelError::config(format!(
                    "display '{}' is declared twice",
                    d.id
                )));
            }
        }
        Ok(())
    }

    /// Build a pool-backed registry and create every declared display.
    pub fn build_registry(&self) -> TileReelResult<DisplayRegistry> {
        let registry = DisplayRegistry::with_pool(self.tick_workers)?;
        for d in &self.displays {
            registry.create(&d.id, d.origin_x, d.origin_z, d.tiles_wide, d.tiles_high)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
