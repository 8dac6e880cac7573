//! Persisting encoded sprites.
//!
//! The sink chooses the final, unique file name from a suggested name and
//! writes an import sidecar so the output is picked up as a point-filtered
//! sprite with no mip chain.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use spritemerge_common::error::{SpritemergeError, SpritemergeResult};
use spritemerge_sprite_model::ImportSettings;

/// File extension of persisted sprites.
pub const SPRITE_EXTENSION: &str = "png";

/// Destination for encoded sprites.
pub trait SpriteSink {
    /// Store `bytes` under a name derived from `suggested_name`.
    ///
    /// Returns where the sprite ended up.
    fn persist(&self, bytes: &[u8], suggested_name: &str) -> SpritemergeResult<PathBuf>;
}

/// Suggested output name: `{prefix}_{yyyyMMdd_HHmmss}`.
pub fn suggest_name<Tz>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{prefix}_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Writes sprites into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    settings: ImportSettings,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            settings: ImportSettings::combined_sprite(),
        }
    }

    /// Override the import settings written next to each sprite.
    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free `name.png`, `name_1.png`, `name_2.png`, ...
    pub fn unique_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(format!("{name}.{SPRITE_EXTENSION}"));
        if !candidate.exists() {
            return candidate;
        }
        (1u32..)
            .map(|n| self.dir.join(format!("{name}_{n}.{SPRITE_EXTENSION}")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl SpriteSink for DirectorySink {
    fn persist(&self, bytes: &[u8], suggested_name: &str) -> SpritemergeResult<PathBuf> {
        let fail = |what: &str, path: &Path, e: std::io::Error| {
            SpritemergeError::persistence(format!("{what} {}: {e}", path.display()))
        };

        std::fs::create_dir_all(&self.dir).map_err(|e| fail("cannot create", &self.dir, e))?;

        let path = self.unique_path(suggested_name);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = self.dir.join(format!(".{file_name}.tmp"));

        // The sprite is renamed into place last; any earlier failure leaves
        // neither the sprite nor its sidecar behind.
        if let Err(e) = std::fs::write(&temp, bytes) {
            std::fs::remove_file(&temp).ok();
            return Err(fail("cannot write", &temp, e));
        }
        if let Err(e) = self.settings.save_for(&path) {
            std::fs::remove_file(&temp).ok();
            std::fs::remove_file(ImportSettings::sidecar_path(&path)).ok();
            return Err(fail("cannot write import settings for", &path, e));
        }
        if let Err(e) = std::fs::rename(&temp, &path) {
            std::fs::remove_file(&temp).ok();
            std::fs::remove_file(ImportSettings::sidecar_path(&path)).ok();
            return Err(fail("cannot move into place", &path, e));
        }

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved combined sprite");
        Ok(path)
    }
}
