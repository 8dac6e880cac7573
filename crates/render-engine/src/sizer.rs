//! Canvas sizing per layout mode.

use spritemerge_common::error::{SpritemergeError, SpritemergeResult};
use spritemerge_sprite_model::{LayoutMode, RegionSize};

/// Largest canvas edge, in pixels.
pub const MAX_CANVAS_DIMENSION: u64 = 16384;

/// Output canvas size for `sizes` laid out with `mode`.
///
/// - `Horizontal`: sum of widths, max of heights
/// - `Vertical`: max of widths, sum of heights
/// - `Overlay`: max of widths, max of heights
///
/// Each edge is at least 1, so regions with zero-sized rects still yield
/// an allocatable canvas.
pub fn canvas_size(sizes: &[RegionSize], mode: LayoutMode) -> SpritemergeResult<(u32, u32)> {
    if sizes.is_empty() {
        return Err(SpritemergeError::EmptyComposition);
    }

    let sum_w: u64 = sizes.iter().map(|s| s.width as u64).sum();
    let sum_h: u64 = sizes.iter().map(|s| s.height as u64).sum();
    let max_w = sizes.iter().map(|s| s.width as u64).max().unwrap_or(0);
    let max_h = sizes.iter().map(|s| s.height as u64).max().unwrap_or(0);

    let (width, height) = match mode {
        LayoutMode::Horizontal => (sum_w, max_h),
        LayoutMode::Vertical => (max_w, sum_h),
        LayoutMode::Overlay => (max_w, max_h),
    };

    if width > MAX_CANVAS_DIMENSION || height > MAX_CANVAS_DIMENSION {
        return Err(SpritemergeError::CanvasTooLarge { width, height });
    }

    Ok((width.max(1) as u32, height.max(1) as u32))
}
