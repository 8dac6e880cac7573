//! Combine manifests: a serializable, reusable combine request.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "name": "hero-walk",
//!   "mode": "horizontal",
//!   "regions": [
//!     { "source": "sheets/hero.png", "rect": { "x": 0, "y": 0, "width": 16, "height": 16 } },
//!     { "source": "sheets/hat.png" }
//!   ]
//! }
//! ```
//!
//! Source paths are relative to the manifest's directory. A region
//! without a rect covers the whole image.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composition::{CompositionRequest, LayoutMode};
use crate::geometry::{Rect, SourceRegion};

pub const MANIFEST_VERSION: &str = "1.0";

/// Top-level manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineManifest {
    /// Schema version.
    pub version: String,

    /// Human-readable name, also used as the output name prefix.
    #[serde(default)]
    pub name: String,

    pub mode: LayoutMode,

    pub regions: Vec<ManifestRegion>,
}

/// One entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRegion {
    /// Image path, relative to the manifest directory.
    pub source: String,

    /// Crop rectangle; the whole image when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
}

impl ManifestRegion {
    /// Resolve against `base`, filling a missing rect from `dimensions`.
    ///
    /// A source whose dimensions are unknown gets an empty rect; the
    /// extractor reports it when the region is attempted.
    pub fn resolve<F>(&self, base: &Path, dimensions: F) -> SourceRegion
    where
        F: FnOnce(&Path) -> Option<(u32, u32)>,
    {
        let path = base.join(&self.source);
        let rect = match self.rect {
            Some(rect) => rect,
            None => dimensions(&path)
                .map(|(w, h)| Rect::full(w, h))
                .unwrap_or(Rect::full(0, 0)),
        };
        SourceRegion::new(path.to_string_lossy(), rect)
    }
}

/// A manifest together with the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// Path of the manifest file.
    pub path: PathBuf,

    pub manifest: CombineManifest,
}

impl CombineManifest {
    pub fn new(name: impl Into<String>, mode: LayoutMode) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: name.into(),
            mode,
            regions: vec![],
        }
    }

    /// Append a region.
    pub fn push(&mut self, source: impl Into<String>, rect: Option<Rect>) -> &mut Self {
        self.regions.push(ManifestRegion {
            source: source.into(),
            rect,
        });
        self
    }
}

impl LoadedManifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref().to_path_buf();

        let json = std::fs::read_to_string(&path).map_err(|e| ManifestError::IoError {
            path: path.clone(),
            source: e,
        })?;

        let manifest: CombineManifest =
            serde_json::from_str(&json).map_err(|e| ManifestError::ParseError {
                path: path.clone(),
                source: e,
            })?;

        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::ValidationError {
                message: format!(
                    "unsupported manifest version {} (expected {MANIFEST_VERSION})",
                    manifest.version
                ),
            });
        }

        Ok(Self { path, manifest })
    }

    /// Save the manifest to its path.
    pub fn save(&self) -> Result<(), ManifestError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ManifestError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json =
            serde_json::to_string_pretty(&self.manifest).map_err(|e| ManifestError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;
        std::fs::write(&self.path, json).map_err(|e| ManifestError::IoError {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Directory that relative source paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Build a composition request, resolving whole-image regions with `dimensions`.
    pub fn to_request<F>(&self, mut dimensions: F) -> CompositionRequest
    where
        F: FnMut(&Path) -> Option<(u32, u32)>,
    {
        let base = self.base_dir();
        let regions = self
            .manifest
            .regions
            .iter()
            .map(|r| r.resolve(&base, &mut dimensions))
            .collect();
        CompositionRequest::new(regions, self.manifest.mode)
    }

    /// Check that the manifest can be combined: it has regions, every
    /// source exists, and no explicit rect is empty.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.manifest.regions.is_empty() {
            errors.push("Manifest lists no regions".to_string());
        }

        let base = self.base_dir();
        for (i, region) in self.manifest.regions.iter().enumerate() {
            if !base.join(&region.source).exists() {
                errors.push(format!("Region {i}: source missing: {}", region.source));
            }
            if let Some(rect) = region.rect {
                if rect.is_empty() {
                    errors.push(format!("Region {i}: rect {rect} covers no pixels"));
                }
            }
        }

        errors
    }
}

/// Errors that can occur when working with manifests.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid manifest: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_serialization_omits_missing_rect() {
        let mut manifest = CombineManifest::new("walk", LayoutMode::Horizontal);
        manifest
            .push("a.png", Some(Rect::new(0, 0, 4, 4)))
            .push("b.png", None);

        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"mode\":\"horizontal\""));
        assert_eq!(json.matches("\"rect\"").count(), 1);

        let parsed: CombineManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.regions, manifest.regions);
    }

    #[test]
    fn test_resolve_whole_image() {
        let region = ManifestRegion {
            source: "b.png".into(),
            rect: None,
        };
        let resolved = region.resolve(Path::new("art"), |_| Some((12, 9)));
        assert_eq!(resolved.rect, Rect::full(12, 9));
        assert!(resolved.source_id.ends_with("b.png"));

        let unknown = region.resolve(Path::new("art"), |_| None);
        assert!(unknown.rect.is_empty());
    }

    #[test]
    fn test_loaded_manifest_save_load_and_validate() {
        let dir = std::env::temp_dir().join("spritemerge_test_manifest");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("present.png"), b"png").unwrap();

        let mut manifest = CombineManifest::new("test", LayoutMode::Overlay);
        manifest
            .push("present.png", Some(Rect::new(0, 0, 0, 2)))
            .push("absent.png", None);
        let loaded = LoadedManifest {
            path: dir.join("combine.json"),
            manifest,
        };
        loaded.save().unwrap();

        let reloaded = LoadedManifest::load(dir.join("combine.json")).unwrap();
        assert_eq!(reloaded.manifest.mode, LayoutMode::Overlay);

        let errors = reloaded.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("covers no pixels")));
        assert!(errors.iter().any(|e| e.contains("source missing: absent.png")));

        let request = reloaded.to_request(|_| Some((3, 3)));
        assert_eq!(request.regions.len(), 2);
        assert_eq!(request.regions[1].rect, Rect::full(3, 3));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = std::env::temp_dir().join("spritemerge_test_manifest_version");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("combine.json");
        std::fs::write(
            &path,
            r#"{ "version": "9.9", "mode": "vertical", "regions": [] }"#,
        )
        .unwrap();

        let err = LoadedManifest::load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::ValidationError { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
