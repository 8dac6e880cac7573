//! Region extraction: turning `(source, rect)` into an owned pixel buffer.
//!
//! Two strategies sit behind the same [`ExtractStrategy`] contract:
//!
//! - [`DirectRead`] copies rows straight out of the source's backing
//!   buffer. It only works when the source exposes raw pixel access.
//! - [`OffscreenReadback`] draws the rect into a temporary offscreen
//!   surface sized exactly to the rect and reads the surface back. It
//!   works for any source, at the cost of an extra draw.
//!
//! [`RegionExtractor`] tries the primary strategy and falls back to the
//! secondary one. Offscreen surfaces are leased from a [`SurfacePool`]
//! and returned when the lease drops, on every exit path.
//!
//! [`ReadabilityLease`] handles the other scoped resource: it may switch
//! a source's raw-access flag on before extraction and always switches it
//! back when dropped.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spritemerge_common::error::SpritemergeResult;
use spritemerge_sprite_model::{ExtractionError, PixelBuffer, Rect, BYTES_PER_PIXEL};

/// Largest surface edge the pool will allocate, in pixels.
pub const MAX_SURFACE_DIMENSION: u32 = 16384;

/// An image that regions can be cropped from.
pub trait SourceImage {
    /// Identifier the image was opened with.
    fn id(&self) -> &str;

    /// Full image size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Backing pixels, when the image exposes raw access.
    fn raw_pixels(&self) -> Option<&PixelBuffer>;

    /// Draw `src` into `surface` with its top-left at the surface origin.
    fn draw_into(&self, src: Rect, surface: &mut OffscreenSurface) -> Result<(), ExtractionError>;
}

/// Resolves source identifiers to images.
pub trait SourceLibrary {
    fn open(&self, source_id: &str) -> Result<Box<dyn SourceImage>, ExtractionError>;
}

/// Capability toggle for raw pixel access on a source.
///
/// Implementations own any persistence of the flag, so both methods
/// take `&self`.
pub trait ReadabilityControl {
    fn is_readable(&self, source_id: &str) -> SpritemergeResult<bool>;

    fn set_readable(&self, source_id: &str, readable: bool) -> SpritemergeResult<()>;
}

/// Copy the part of `src` that lies inside `image` into `surface`.
///
/// Pixels of `src` outside the image stay as they are on the surface
/// (transparent after [`OffscreenSurface::clear`]).
pub fn draw_clipped(image: &PixelBuffer, src: Rect, surface: &mut OffscreenSurface) {
    let x0 = (src.x as u64).min(image.width() as u64);
    let x1 = src.right().min(image.width() as u64);
    let y0 = (src.y as u64).min(image.height() as u64);
    let y1 = src.bottom().min(image.height() as u64);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let target = surface.buffer_mut();
    let copy_w = ((x1 - x0) as usize).min(target.width() as usize);
    let byte_start = x0 as usize * BYTES_PER_PIXEL;
    let byte_len = copy_w * BYTES_PER_PIXEL;

    for (dy, sy) in (y0..y1).enumerate() {
        if dy as u32 >= target.height() {
            break;
        }
        let row = &image.row(sy as u32)[byte_start..byte_start + byte_len];
        target.row_mut(dy as u32)[..byte_len].copy_from_slice(row);
    }
}

/// A temporary render target.
#[derive(Debug)]
pub struct OffscreenSurface {
    buffer: PixelBuffer,
}

impl OffscreenSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: PixelBuffer::new_transparent(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        for y in 0..self.buffer.height() {
            self.buffer.row_mut(y).fill(0);
        }
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    /// Copy the surface contents out.
    pub fn read_back(&self) -> PixelBuffer {
        self.buffer.clone()
    }
}

/// Hands out offscreen surfaces and tracks how many are live.
#[derive(Debug, Default)]
pub struct SurfacePool {
    live: AtomicUsize,
    acquired_total: AtomicUsize,
}

impl SurfacePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease a transparent `width x height` surface.
    pub fn acquire(&self, width: u32, height: u32) -> Result<SurfaceLease<'_>, ExtractionError> {
        if width == 0 || height == 0 {
            return Err(ExtractionError::RenderFailed {
                message: format!("cannot allocate a {width}x{height} surface"),
            });
        }
        if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            return Err(ExtractionError::RenderFailed {
                message: format!(
                    "{width}x{height} surface exceeds the {MAX_SURFACE_DIMENSION}px limit"
                ),
            });
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        self.acquired_total.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(width, height, "Acquired offscreen surface");

        Ok(SurfaceLease {
            pool: self,
            surface: OffscreenSurface::new(width, height),
        })
    }

    /// Surfaces currently leased.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Surfaces leased over the pool's lifetime.
    pub fn acquired_total(&self) -> usize {
        self.acquired_total.load(Ordering::SeqCst)
    }
}

/// A leased surface; returned to the pool on drop.
#[derive(Debug)]
pub struct SurfaceLease<'a> {
    pool: &'a SurfacePool,
    surface: OffscreenSurface,
}

impl Deref for SurfaceLease<'_> {
    type Target = OffscreenSurface;

    fn deref(&self) -> &Self::Target {
        &self.surface
    }
}

impl DerefMut for SurfaceLease<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.surface
    }
}

impl Drop for SurfaceLease<'_> {
    fn drop(&mut self) {
        self.pool.live.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(
            width = self.surface.width(),
            height = self.surface.height(),
            "Released offscreen surface"
        );
    }
}

/// One way of obtaining a region's pixels.
pub trait ExtractStrategy {
    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    fn extract(&self, source: &dyn SourceImage, rect: Rect) -> Result<PixelBuffer, ExtractionError>;
}

/// Bulk row copy from the source's backing buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectRead;

impl ExtractStrategy for DirectRead {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn extract(&self, source: &dyn SourceImage, rect: Rect) -> Result<PixelBuffer, ExtractionError> {
        let pixels = source
            .raw_pixels()
            .ok_or_else(|| ExtractionError::NotReadable {
                source_id: source.id().to_string(),
            })?;

        pixels.crop(rect).ok_or(ExtractionError::OutOfBounds {
            rect,
            width: pixels.width(),
            height: pixels.height(),
        })
    }
}

/// Draw into a leased offscreen surface, then read it back.
#[derive(Debug, Default, Clone)]
pub struct OffscreenReadback {
    pool: Arc<SurfacePool>,
}

impl OffscreenReadback {
    pub fn new(pool: Arc<SurfacePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<SurfacePool> {
        &self.pool
    }
}

impl ExtractStrategy for OffscreenReadback {
    fn name(&self) -> &'static str {
        "offscreen-readback"
    }

    fn extract(&self, source: &dyn SourceImage, rect: Rect) -> Result<PixelBuffer, ExtractionError> {
        // Partial overlap is clipped; no overlap at all has nothing to draw.
        let (width, height) = source.dimensions();
        if rect.x >= width || rect.y >= height {
            return Err(ExtractionError::OutOfBounds {
                rect,
                width,
                height,
            });
        }

        let mut surface = self.pool.acquire(rect.width, rect.height)?;
        source.draw_into(rect, &mut surface)?;
        Ok(surface.read_back())
    }
}

/// Try-primary, fall-back-to-secondary extraction.
pub struct RegionExtractor {
    primary: Box<dyn ExtractStrategy>,
    fallback: Box<dyn ExtractStrategy>,
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(Arc::new(SurfacePool::new()))
    }
}

impl RegionExtractor {
    /// Direct read, falling back to offscreen readback through `pool`.
    pub fn new(pool: Arc<SurfacePool>) -> Self {
        Self::with_strategies(Box::new(DirectRead), Box::new(OffscreenReadback::new(pool)))
    }

    pub fn with_strategies(
        primary: Box<dyn ExtractStrategy>,
        fallback: Box<dyn ExtractStrategy>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Extract `rect` from `source`.
    ///
    /// Fails only when both strategies fail; the error then carries both causes.
    pub fn extract(
        &self,
        source: &dyn SourceImage,
        rect: Rect,
    ) -> Result<PixelBuffer, ExtractionError> {
        if rect.is_empty() {
            return Err(ExtractionError::EmptyRect { rect });
        }

        let primary_err = match self.primary.extract(source, rect) {
            Ok(pixels) => return Ok(pixels),
            Err(e) => e,
        };

        tracing::debug!(
            source = source.id(),
            %rect,
            strategy = self.fallback.name(),
            reason = %primary_err,
            "Primary extraction failed, using fallback"
        );

        self.fallback
            .extract(source, rect)
            .map_err(|fallback_err| ExtractionError::Exhausted {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })
    }
}

/// Scoped readability changes, undone on drop.
///
/// Each source is touched at most once: its original flag is recorded on
/// first contact, and only sources whose flag was actually changed are
/// restored.
pub struct ReadabilityLease<'a> {
    control: Option<&'a dyn ReadabilityControl>,
    /// Original readability per touched source.
    touched: HashMap<String, bool>,
    changed: Vec<String>,
}

impl<'a> ReadabilityLease<'a> {
    /// A lease that never toggles anything.
    pub fn disabled() -> Self {
        Self {
            control: None,
            touched: HashMap::new(),
            changed: vec![],
        }
    }

    pub fn new(control: &'a dyn ReadabilityControl) -> Self {
        Self {
            control: Some(control),
            touched: HashMap::new(),
            changed: vec![],
        }
    }

    /// Try to make `source_id` readable. Returns whether it now is.
    ///
    /// Failures are logged and reported as `false`; the caller then
    /// relies on the fallback strategy.
    pub fn request(&mut self, source_id: &str) -> bool {
        let Some(control) = self.control else {
            return false;
        };

        if let Some(&original) = self.touched.get(source_id) {
            return original || self.changed.iter().any(|id| id == source_id);
        }

        let original = match control.is_readable(source_id) {
            Ok(readable) => readable,
            Err(e) => {
                tracing::warn!(source = source_id, error = %e, "Could not query readability");
                return false;
            }
        };
        self.touched.insert(source_id.to_string(), original);
        if original {
            return true;
        }

        match control.set_readable(source_id, true) {
            Ok(()) => {
                tracing::debug!(source = source_id, "Enabled readability");
                self.changed.push(source_id.to_string());
                true
            }
            Err(e) => {
                tracing::warn!(source = source_id, error = %e, "Could not enable readability");
                false
            }
        }
    }

    /// Sources whose flag this lease changed and will restore.
    pub fn changed(&self) -> &[String] {
        &self.changed
    }
}

impl Drop for ReadabilityLease<'_> {
    fn drop(&mut self) {
        let Some(control) = self.control else {
            return;
        };
        for source_id in self.changed.drain(..) {
            let original = self.touched.get(&source_id).copied().unwrap_or(false);
            match control.set_readable(&source_id, original) {
                Ok(()) => tracing::debug!(source = %source_id, "Restored readability"),
                Err(e) => {
                    tracing::error!(source = %source_id, error = %e, "Failed to restore readability")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{MemoryLibrary, MemorySource};
    use spritemerge_sprite_model::Rgba;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new_transparent(width, height);
        for y in 0..height {
            for x in 0..width {
                let c = if (x + y) % 2 == 0 { 255 } else { 0 };
                buf.put(x, y, Rgba::new(c, x as u8, y as u8, 255));
            }
        }
        buf
    }

    #[test]
    fn test_direct_read_crops() {
        let source = MemorySource::new("s", checker(6, 4));
        let out = DirectRead.extract(&source, Rect::new(2, 1, 3, 2)).unwrap();
        assert_eq!(out, checker(6, 4).crop(Rect::new(2, 1, 3, 2)).unwrap());
    }

    #[test]
    fn test_direct_read_requires_raw_access() {
        let source = MemorySource::new("s", checker(4, 4)).unreadable();
        let err = DirectRead.extract(&source, Rect::full(4, 4)).unwrap_err();
        assert!(matches!(err, ExtractionError::NotReadable { .. }));
    }

    #[test]
    fn test_readback_matches_direct_read() {
        let pool = Arc::new(SurfacePool::new());
        let readback = OffscreenReadback::new(pool.clone());
        let source = MemorySource::new("s", checker(8, 8)).unreadable();

        let out = readback.extract(&source, Rect::new(1, 3, 5, 4)).unwrap();
        assert_eq!(out, checker(8, 8).crop(Rect::new(1, 3, 5, 4)).unwrap());
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.acquired_total(), 1);
    }

    #[test]
    fn test_readback_leaves_outside_pixels_transparent() {
        let readback = OffscreenReadback::default();
        let source = MemorySource::new("s", PixelBuffer::filled(2, 2, Rgba::opaque(9, 9, 9)));

        let out = readback.extract(&source, Rect::new(1, 1, 3, 3)).unwrap();
        assert_eq!(out.get(0, 0), Some(Rgba::opaque(9, 9, 9)));
        assert_eq!(out.get(1, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(out.get(0, 2), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_surface_released_when_draw_fails() {
        let pool = Arc::new(SurfacePool::new());
        let readback = OffscreenReadback::new(pool.clone());
        let source = MemorySource::new("s", checker(4, 4)).failing_render();

        assert!(readback.extract(&source, Rect::full(4, 4)).is_err());
        assert_eq!(pool.acquired_total(), 1);
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn test_pool_rejects_oversized_surface() {
        let pool = SurfacePool::new();
        assert!(pool.acquire(MAX_SURFACE_DIMENSION + 1, 1).is_err());
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn test_extractor_falls_back_for_unreadable_source() {
        let pool = Arc::new(SurfacePool::new());
        let extractor = RegionExtractor::new(pool.clone());
        let source = MemorySource::new("s", checker(4, 4)).unreadable();

        let out = extractor.extract(&source, Rect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(out.size().width, 2);
        assert_eq!(pool.acquired_total(), 1);
    }

    #[test]
    fn test_extractor_falls_back_for_out_of_bounds_rect() {
        let extractor = RegionExtractor::default();
        let source = MemorySource::new("s", checker(4, 4));

        let out = extractor.extract(&source, Rect::new(2, 2, 4, 4)).unwrap();
        assert_eq!(out.get(0, 0), checker(4, 4).get(2, 2));
        assert_eq!(out.get(3, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_extractor_rejects_rect_outside_source() {
        let pool = Arc::new(SurfacePool::new());
        let extractor = RegionExtractor::new(pool.clone());
        let source = MemorySource::new("s", checker(4, 4));

        let err = extractor.extract(&source, Rect::new(4, 0, 2, 2)).unwrap_err();
        match err {
            ExtractionError::Exhausted { primary, fallback } => {
                assert!(matches!(*primary, ExtractionError::OutOfBounds { .. }));
                assert!(matches!(
                    *fallback,
                    ExtractionError::OutOfBounds {
                        width: 4,
                        height: 4,
                        ..
                    }
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(pool.acquired_total(), 0);
    }

    #[test]
    fn test_extractor_reports_both_failures() {
        let extractor = RegionExtractor::default();
        let source = MemorySource::new("s", checker(4, 4))
            .unreadable()
            .failing_render();

        let err = extractor.extract(&source, Rect::full(4, 4)).unwrap_err();
        match err {
            ExtractionError::Exhausted { primary, fallback } => {
                assert!(matches!(*primary, ExtractionError::NotReadable { .. }));
                assert!(matches!(*fallback, ExtractionError::RenderFailed { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extractor_rejects_empty_rect() {
        let extractor = RegionExtractor::default();
        let source = MemorySource::new("s", checker(4, 4));
        let err = extractor.extract(&source, Rect::new(1, 1, 0, 3)).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyRect { .. }));
    }

    #[test]
    fn test_lease_restores_on_drop() {
        let library = MemoryLibrary::new();
        library.insert_unreadable("a", checker(2, 2));
        library.insert("b", checker(2, 2));

        {
            let mut lease = ReadabilityLease::new(&library);
            assert!(lease.request("a"));
            assert!(lease.request("a"));
            assert!(lease.request("b"));
            assert!(library.is_readable("a").unwrap());
            assert_eq!(lease.changed(), ["a".to_string()]);
        }

        assert!(!library.is_readable("a").unwrap());
        assert!(library.is_readable("b").unwrap());
        assert_eq!(library.set_readable_calls("a"), 2);
        assert_eq!(library.set_readable_calls("b"), 0);
    }

    #[test]
    fn test_lease_treats_toggle_failure_as_fallback() {
        let library = MemoryLibrary::new();
        library.insert_unreadable("locked", checker(2, 2));
        library.lock_readability("locked");

        let mut lease = ReadabilityLease::new(&library);
        assert!(!lease.request("locked"));
        assert!(lease.changed().is_empty());
        drop(lease);

        assert!(!library.is_readable("locked").unwrap());
    }

    #[test]
    fn test_disabled_lease_never_toggles() {
        let mut lease = ReadabilityLease::disabled();
        assert!(!lease.request("anything"));
    }
}
