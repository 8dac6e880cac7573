//! Canvas compositor: places extracted regions and blends them in.
//!
//! Placement per layout mode (top-left origin, row 0 at the top):
//!
//! ```text
//! Horizontal        Vertical      Overlay
//! ┌──┬────┬─┐       ┌────┐        ┌──────┐
//! │0 │ 1  │2│       │0   │        │ ┌──┐ │
//! │  │    └─┤       ├────┴┐       │ │01│ │
//! └──┤      │       │1    │       │ └──┘ │
//!    └──────┘       ├──┬──┘       └──────┘
//!                   │2 │
//!                   └──┘
//! ```
//!
//! Horizontal and vertical layouts overwrite; overlays use source-over.
//! Any destination pixel outside the canvas is dropped.

use spritemerge_common::error::{SpritemergeError, SpritemergeResult};
use spritemerge_sprite_model::{LayoutMode, PixelBuffer, RegionSize, Rgba, BYTES_PER_PIXEL};

use crate::sizer::canvas_size;

/// How a source pixel combines with the canvas pixel beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source replaces destination.
    Replace,
    /// Porter-Duff source-over, non-premultiplied.
    SourceOver,
}

impl From<LayoutMode> for BlendMode {
    fn from(mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Horizontal | LayoutMode::Vertical => BlendMode::Replace,
            LayoutMode::Overlay => BlendMode::SourceOver,
        }
    }
}

/// One entry of a composition: the region's requested size and, if
/// extraction succeeded, its pixels.
#[derive(Debug, Clone)]
pub struct RegionSlot {
    pub size: RegionSize,
    pub pixels: Option<PixelBuffer>,
}

impl RegionSlot {
    pub fn extracted(pixels: PixelBuffer) -> Self {
        Self {
            size: pixels.size(),
            pixels: Some(pixels),
        }
    }

    pub fn failed(size: RegionSize) -> Self {
        Self { size, pixels: None }
    }
}

/// A finished canvas plus counts.
#[derive(Debug, Clone)]
pub struct Composition {
    pub canvas: PixelBuffer,
    pub included: usize,
    pub skipped: usize,
}

/// Top-left offset of every region, in input order.
///
/// Offsets depend only on the requested sizes, so a failed region still
/// occupies its slot.
pub fn placements(sizes: &[RegionSize], canvas: (u32, u32), mode: LayoutMode) -> Vec<(i64, i64)> {
    let (canvas_w, canvas_h) = (canvas.0 as i64, canvas.1 as i64);
    let mut cursor = 0i64;

    sizes
        .iter()
        .map(|size| {
            let (w, h) = (size.width as i64, size.height as i64);
            match mode {
                LayoutMode::Horizontal => {
                    let offset = (cursor, 0);
                    cursor += w;
                    offset
                }
                LayoutMode::Vertical => {
                    let offset = (0, cursor);
                    cursor += h;
                    offset
                }
                LayoutMode::Overlay => ((canvas_w - w).div_euclid(2), (canvas_h - h).div_euclid(2)),
            }
        })
        .collect()
}

/// Source-over for one non-premultiplied pixel pair.
pub fn source_over(dst: Rgba, src: Rgba) -> Rgba {
    match src.a() {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let sa = src.alpha_f32();
    let da = dst.alpha_f32();
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba::TRANSPARENT;
    }

    let channel = |s: u8, d: u8| {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let c = (s * sa + d * da * (1.0 - sa)) / out_a;
        to_u8(c)
    };

    Rgba([
        channel(src.r(), dst.r()),
        channel(src.g(), dst.g()),
        channel(src.b(), dst.b()),
        to_u8(out_a),
    ])
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Draw `src` onto `canvas` with its top-left at `(x, y)`.
///
/// The source is clipped to the canvas. Returns the number of pixels written.
pub fn blit(canvas: &mut PixelBuffer, src: &PixelBuffer, x: i64, y: i64, blend: BlendMode) -> usize {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + src.width() as i64).min(canvas.width() as i64);
    let y1 = (y + src.height() as i64).min(canvas.height() as i64);
    if x0 >= x1 || y0 >= y1 {
        return 0;
    }

    let span = (x1 - x0) as usize;
    let src_start = (x0 - x) as usize * BYTES_PER_PIXEL;
    let dst_start = x0 as usize * BYTES_PER_PIXEL;
    let len = span * BYTES_PER_PIXEL;

    for dy in y0..y1 {
        let src_row = &src.row((dy - y) as u32)[src_start..src_start + len];
        let dst_row = &mut canvas.row_mut(dy as u32)[dst_start..dst_start + len];

        match blend {
            BlendMode::Replace => dst_row.copy_from_slice(src_row),
            BlendMode::SourceOver => {
                for (d, s) in dst_row
                    .chunks_exact_mut(BYTES_PER_PIXEL)
                    .zip(src_row.chunks_exact(BYTES_PER_PIXEL))
                {
                    let dst = Rgba([d[0], d[1], d[2], d[3]]);
                    let src = Rgba([s[0], s[1], s[2], s[3]]);
                    d.copy_from_slice(&source_over(dst, src).0);
                }
            }
        }
    }

    span * (y1 - y0) as usize
}

/// Compose every slot onto a fresh transparent canvas.
///
/// The canvas is sized from all slots, failed ones included. Failed
/// slots are skipped; if every slot failed, nothing is allocated.
pub fn compose(slots: &[RegionSlot], mode: LayoutMode) -> SpritemergeResult<Composition> {
    let sizes: Vec<RegionSize> = slots.iter().map(|s| s.size).collect();
    let (width, height) = canvas_size(&sizes, mode)?;

    let included = slots.iter().filter(|s| s.pixels.is_some()).count();
    if included == 0 {
        return Err(SpritemergeError::NoUsableRegions {
            attempted: slots.len(),
        });
    }

    let blend = BlendMode::from(mode);
    let mut canvas = PixelBuffer::new_transparent(width, height);

    for (i, (slot, (x, y))) in slots
        .iter()
        .zip(placements(&sizes, (width, height), mode))
        .enumerate()
    {
        let Some(pixels) = &slot.pixels else {
            continue;
        };
        let written = blit(&mut canvas, pixels, x, y, blend);
        tracing::trace!(region = i, x, y, written, "Blended region");
    }

    Ok(Composition {
        canvas,
        included,
        skipped: slots.len() - included,
    })
}
