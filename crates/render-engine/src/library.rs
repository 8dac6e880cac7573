//! Source libraries: where source images come from.
//!
//! [`FileLibrary`] treats source ids as image paths and keeps the
//! readability flag in each image's import sidecar. [`MemoryLibrary`]
//! holds decoded buffers in memory, for embedding and tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use spritemerge_common::error::{SpritemergeError, SpritemergeResult};
use spritemerge_sprite_model::{ExtractionError, ImportSettings, PixelBuffer, Rect};

use crate::extract::{
    draw_clipped, OffscreenSurface, ReadabilityControl, SourceImage, SourceLibrary,
};

/// A decoded image with a fixed readability flag.
///
/// The flag is sampled when the source is opened; toggling readability
/// afterwards requires opening it again.
#[derive(Debug, Clone)]
pub struct MemorySource {
    id: String,
    pixels: PixelBuffer,
    readable: bool,
    render_fails: bool,
}

impl MemorySource {
    pub fn new(id: impl Into<String>, pixels: PixelBuffer) -> Self {
        Self {
            id: id.into(),
            pixels,
            readable: true,
            render_fails: false,
        }
    }

    /// Hide raw pixel access.
    pub fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Make every offscreen draw fail.
    pub fn failing_render(mut self) -> Self {
        self.render_fails = true;
        self
    }
}

impl SourceImage for MemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }

    fn raw_pixels(&self) -> Option<&PixelBuffer> {
        self.readable.then_some(&self.pixels)
    }

    fn draw_into(&self, src: Rect, surface: &mut OffscreenSurface) -> Result<(), ExtractionError> {
        if self.render_fails {
            return Err(ExtractionError::RenderFailed {
                message: format!("draw of '{}' rejected", self.id),
            });
        }
        draw_clipped(&self.pixels, src, surface);
        Ok(())
    }
}

#[derive(Debug)]
struct MemoryEntry {
    pixels: PixelBuffer,
    readable: bool,
    locked: bool,
    render_fails: bool,
    set_readable_calls: usize,
}

/// In-memory source library with a togglable readability flag per source.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    entries: RefCell<HashMap<String, MemoryEntry>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable source.
    pub fn insert(&self, id: impl Into<String>, pixels: PixelBuffer) {
        self.insert_entry(id.into(), pixels, true);
    }

    /// Add a source without raw pixel access.
    pub fn insert_unreadable(&self, id: impl Into<String>, pixels: PixelBuffer) {
        self.insert_entry(id.into(), pixels, false);
    }

    fn insert_entry(&self, id: String, pixels: PixelBuffer, readable: bool) {
        self.entries.borrow_mut().insert(
            id,
            MemoryEntry {
                pixels,
                readable,
                locked: false,
                render_fails: false,
                set_readable_calls: 0,
            },
        );
    }

    /// Make `set_readable` fail for `id`.
    pub fn lock_readability(&self, id: &str) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(id) {
            entry.locked = true;
        }
    }

    /// Make offscreen draws of `id` fail.
    pub fn break_rendering(&self, id: &str) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(id) {
            entry.render_fails = true;
        }
    }

    /// Number of `set_readable` calls made for `id`.
    pub fn set_readable_calls(&self, id: &str) -> usize {
        self.entries
            .borrow()
            .get(id)
            .map(|e| e.set_readable_calls)
            .unwrap_or(0)
    }
}

impl SourceLibrary for MemoryLibrary {
    fn open(&self, source_id: &str) -> Result<Box<dyn SourceImage>, ExtractionError> {
        let entries = self.entries.borrow();
        let entry = entries
            .get(source_id)
            .ok_or_else(|| ExtractionError::SourceUnavailable {
                source_id: source_id.to_string(),
                message: "not in library".to_string(),
            })?;

        let mut source = MemorySource::new(source_id, entry.pixels.clone());
        if !entry.readable {
            source = source.unreadable();
        }
        if entry.render_fails {
            source = source.failing_render();
        }
        Ok(Box::new(source))
    }
}

impl ReadabilityControl for MemoryLibrary {
    fn is_readable(&self, source_id: &str) -> SpritemergeResult<bool> {
        self.entries
            .borrow()
            .get(source_id)
            .map(|e| e.readable)
            .ok_or_else(|| SpritemergeError::config(format!("unknown source '{source_id}'")))
    }

    fn set_readable(&self, source_id: &str, readable: bool) -> SpritemergeResult<()> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries
            .get_mut(source_id)
            .ok_or_else(|| SpritemergeError::config(format!("unknown source '{source_id}'")))?;
        entry.set_readable_calls += 1;
        if entry.locked {
            return Err(SpritemergeError::config(format!(
                "readability of '{source_id}' is locked"
            )));
        }
        entry.readable = readable;
        Ok(())
    }
}

/// Image files on disk; source ids are paths.
///
/// Relative ids resolve against the library root. Readability comes from
/// the image's import sidecar (see [`ImportSettings`]).
#[derive(Debug, Clone, Default)]
pub struct FileLibrary {
    root: PathBuf,
}

impl FileLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a source id to a path.
    pub fn resolve(&self, source_id: &str) -> PathBuf {
        let path = Path::new(source_id);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Image size without decoding pixel data.
    pub fn dimensions(&self, source_id: &str) -> Option<(u32, u32)> {
        image::image_dimensions(self.resolve(source_id)).ok()
    }

    /// Decode an image file to RGBA8.
    pub fn decode(path: &Path) -> Result<PixelBuffer, ExtractionError> {
        let unavailable = |message: String| ExtractionError::SourceUnavailable {
            source_id: path.display().to_string(),
            message,
        };

        let decoded = image::open(path).map_err(|e| unavailable(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        PixelBuffer::from_raw(width, height, rgba.into_raw()).map_err(|e| unavailable(e.to_string()))
    }
}

impl SourceLibrary for FileLibrary {
    fn open(&self, source_id: &str) -> Result<Box<dyn SourceImage>, ExtractionError> {
        let path = self.resolve(source_id);
        if !path.exists() {
            return Err(ExtractionError::SourceUnavailable {
                source_id: source_id.to_string(),
                message: format!("file not found: {}", path.display()),
            });
        }

        let settings =
            ImportSettings::load_for(&path).map_err(|e| ExtractionError::SourceUnavailable {
                source_id: source_id.to_string(),
                message: format!("unreadable import settings: {e}"),
            })?;
        let pixels = Self::decode(&path)?;

        tracing::debug!(
            source = source_id,
            width = pixels.width(),
            height = pixels.height(),
            readable = settings.readable,
            "Opened source image"
        );

        let source = MemorySource::new(source_id, pixels);
        Ok(Box::new(if settings.readable {
            source
        } else {
            source.unreadable()
        }))
    }
}

impl ReadabilityControl for FileLibrary {
    fn is_readable(&self, source_id: &str) -> SpritemergeResult<bool> {
        Ok(ImportSettings::load_for(&self.resolve(source_id))?.readable)
    }

    fn set_readable(&self, source_id: &str, readable: bool) -> SpritemergeResult<()> {
        let path = self.resolve(source_id);
        if !path.exists() {
            return Err(SpritemergeError::FileNotFound { path });
        }
        let mut settings = ImportSettings::load_for(&path)?;
        if settings.readable != readable {
            settings.readable = readable;
            settings.save_for(&path)?;
        }
        Ok(())
    }
}
