//! Per-image import settings, stored as a JSON sidecar next to the image.
//!
//! For `hero.png` the sidecar is `hero.png.import.json`. A missing
//! sidecar means default settings, which are readable. Keys this crate
//! does not know about are kept and written back on save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Sidecar file suffix.
pub const IMPORT_SUFFIX: &str = ".import.json";

/// How an image is used once imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextureType {
    #[default]
    Default,
    Sprite,
}

/// Sampling filter used when the image is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
}

/// Import settings for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub texture_type: TextureType,
    pub filter_mode: FilterMode,
    /// Whether a mip chain is generated.
    pub mipmaps: bool,
    /// Whether raw pixel access is exposed.
    pub readable: bool,
    /// Unrecognized sidecar keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            texture_type: TextureType::Default,
            filter_mode: FilterMode::Bilinear,
            mipmaps: true,
            readable: true,
            extra: serde_json::Map::new(),
        }
    }
}

impl ImportSettings {
    /// Settings for a freshly combined sprite: point-filtered, no mips.
    pub fn combined_sprite() -> Self {
        Self {
            texture_type: TextureType::Sprite,
            filter_mode: FilterMode::Point,
            mipmaps: false,
            readable: false,
            extra: serde_json::Map::new(),
        }
    }

    /// Sidecar path for an image path.
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = image.as_os_str().to_os_string();
        name.push(IMPORT_SUFFIX);
        PathBuf::from(name)
    }

    /// Load the sidecar for `image`, or defaults if it does not exist.
    pub fn load_for(image: &Path) -> std::io::Result<Self> {
        let path = Self::sidecar_path(image);
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(&path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Write the sidecar for `image`.
    pub fn save_for(&self, image: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(Self::sidecar_path(image), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path_appends_suffix() {
        let path = ImportSettings::sidecar_path(Path::new("sprites/hero.png"));
        assert_eq!(path, PathBuf::from("sprites/hero.png.import.json"));
    }

    #[test]
    fn test_combined_sprite_settings() {
        let s = ImportSettings::combined_sprite();
        assert_eq!(s.texture_type, TextureType::Sprite);
        assert_eq!(s.filter_mode, FilterMode::Point);
        assert!(!s.mipmaps);
    }

    #[test]
    fn test_missing_sidecar_is_readable_default() {
        let dir = std::env::temp_dir().join("spritemerge_test_import_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let settings = ImportSettings::load_for(&dir.join("nothing.png")).unwrap();
        assert!(settings.readable);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_load_sidecar() {
        let dir = std::env::temp_dir().join("spritemerge_test_import_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("tiles.png");

        let settings = ImportSettings {
            readable: false,
            ..ImportSettings::default()
        };
        settings.save_for(&image).unwrap();
        assert!(!ImportSettings::load_for(&image).unwrap().readable);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_sidecar_fills_defaults() {
        let parsed: ImportSettings = serde_json::from_str(r#"{ "readable": false }"#).unwrap();
        assert!(!parsed.readable);
        assert!(parsed.mipmaps);
        assert_eq!(parsed.texture_type, TextureType::Default);
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let dir = std::env::temp_dir().join("spritemerge_test_import_extra");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("tiles.png");
        std::fs::write(
            ImportSettings::sidecar_path(&image),
            r#"{ "readable": false, "pixels_per_unit": 32, "tags": ["ui"] }"#,
        )
        .unwrap();

        let mut settings = ImportSettings::load_for(&image).unwrap();
        assert_eq!(settings.extra.len(), 2);
        settings.readable = true;
        settings.save_for(&image).unwrap();

        let json = std::fs::read_to_string(ImportSettings::sidecar_path(&image)).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["pixels_per_unit"], 32);
        assert_eq!(raw["tags"][0], "ui");
        assert_eq!(raw["readable"], true);

        std::fs::remove_dir_all(&dir).ok();
    }
}
