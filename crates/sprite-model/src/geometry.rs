//! Rectangles and region sizes in source-pixel space.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height of a region, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionSize {
    pub width: u32,
    pub height: u32,
}

impl RegionSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A rectangle in pixel space.
///
/// `(x, y)` is the top-left corner. `(0, 0)` is the top-left pixel of
/// the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width x height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn size(&self) -> RegionSize {
        RegionSize::new(self.width, self.height)
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Whether the rectangle lies entirely inside a `width x height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Error parsing a rectangle from `x,y,w,h`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid rectangle '{input}': expected x,y,width,height")]
pub struct ParseRectError {
    pub input: String,
}

impl std::str::FromStr for Rect {
    type Err = ParseRectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRectError {
            input: s.to_string(),
        };
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err())?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(Rect::new(*x, *y, *w, *h)),
            _ => Err(err()),
        }
    }
}

/// One rectangular crop of one source image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRegion {
    /// Identifier the source library resolves (for files, a path).
    pub source_id: String,

    /// Crop rectangle in source-pixel space.
    pub rect: Rect,
}

impl SourceRegion {
    pub fn new(source_id: impl Into<String>, rect: Rect) -> Self {
        Self {
            source_id: source_id.into(),
            rect,
        }
    }

    pub fn size(&self) -> RegionSize {
        self.rect.size()
    }
}
