//! RGBA8 pixels and pixel buffers.
//!
//! Buffers are non-premultiplied RGBA8, row-major, with row 0 at the top.
//! All bulk operations work on whole rows.

use crate::geometry::{Rect, RegionSize};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A single non-premultiplied RGBA8 pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Alpha in `[0.0, 1.0]`.
    pub fn alpha_f32(&self) -> f32 {
        self.0[3] as f32 / 255.0
    }
}

/// Error building a buffer from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Pixel data length {actual} does not match {width}x{height} RGBA8 ({expected} bytes)")]
pub struct BufferSizeError {
    pub width: u32,
    pub height: u32,
    pub expected: usize,
    pub actual: usize,
}

/// An owned RGBA8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent buffer.
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// A buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&color.0);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap raw RGBA8 bytes. The length must be exactly `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BufferSizeError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(BufferSizeError {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> RegionSize {
        RegionSize::new(self.width, self.height)
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    fn row_stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.row_stride() + x as usize * BYTES_PER_PIXEL
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let p = &self.pixels[i..i + BYTES_PER_PIXEL];
        Some(Rgba([p[0], p[1], p[2], p[3]]))
    }

    /// Set the pixel at `(x, y)`. Writes outside the buffer are ignored.
    pub fn put(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&color.0);
    }

    /// Row `y` as raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.row_stride();
        &self.pixels[start..start + self.row_stride()]
    }

    /// Row `y` as mutable raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.row_stride();
        let start = y as usize * stride;
        &mut self.pixels[start..start + stride]
    }

    /// Copy out a sub-rectangle, row by row.
    ///
    /// Returns `None` when `rect` is not fully inside the buffer.
    pub fn crop(&self, rect: Rect) -> Option<PixelBuffer> {
        if !rect.fits_within(self.width, self.height) {
            return None;
        }
        let row_bytes = rect.width as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = self.offset(rect.x, y);
            pixels.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        Some(PixelBuffer {
            width: rect.width,
            height: rect.height,
            pixels,
        })
    }

    /// Iterate over all pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.pixels
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| Rgba([p[0], p[1], p[2], p[3]]))
    }

    /// Whether every pixel has zero alpha.
    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.chunks_exact(BYTES_PER_PIXEL).all(|p| p[3] == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new_transparent(width, height);
        for y in 0..height {
            for x in 0..width {
                buf.put(x, y, Rgba::opaque(x as u8, y as u8, 7));
            }
        }
        buf
    }

    #[test]
    fn test_new_is_transparent() {
        let buf = PixelBuffer::new_transparent(3, 2);
        assert_eq!(buf.as_bytes().len(), 3 * 2 * 4);
        assert!(buf.is_fully_transparent());
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(err.expected, 16);
        assert_eq!(err.actual, 15);
    }

    #[test]
    fn test_get_put_out_of_range() {
        let mut buf = PixelBuffer::new_transparent(2, 2);
        buf.put(5, 5, Rgba::opaque(1, 2, 3));
        assert!(buf.is_fully_transparent());
        assert_eq!(buf.get(2, 0), None);
    }

    #[test]
    fn test_crop_copies_rows() {
        let buf = gradient(5, 4);
        let crop = buf.crop(Rect::new(1, 2, 3, 2)).unwrap();
        assert_eq!(crop.size(), RegionSize::new(3, 2));
        assert_eq!(crop.get(0, 0), Some(Rgba::opaque(1, 2, 7)));
        assert_eq!(crop.get(2, 1), Some(Rgba::opaque(3, 3, 7)));
    }

    #[test]
    fn test_crop_outside_is_none() {
        let buf = gradient(5, 4);
        assert!(buf.crop(Rect::new(3, 0, 3, 1)).is_none());
        assert!(buf.crop(Rect::new(0, 0, 5, 4)).is_some());
    }

    #[test]
    fn test_rows() {
        let mut buf = gradient(3, 3);
        assert_eq!(&buf.row(1)[0..4], &[0, 1, 7, 255]);
        buf.row_mut(2).fill(0);
        assert_eq!(buf.get(1, 2), Some(Rgba::TRANSPARENT));
    }

    proptest! {
        #[test]
        fn prop_crop_matches_pixel_reads(
            x in 0u32..6,
            y in 0u32..5,
            w in 0u32..7,
            h in 0u32..6,
        ) {
            let buf = gradient(6, 5);
            let rect = Rect::new(x, y, w, h);
            match buf.crop(rect) {
                Some(crop) => {
                    prop_assert!(rect.fits_within(6, 5));
                    for cy in 0..h {
                        for cx in 0..w {
                            prop_assert_eq!(crop.get(cx, cy), buf.get(x + cx, y + cy));
                        }
                    }
                }
                None => prop_assert!(!rect.fits_within(6, 5)),
            }
        }
    }
}
