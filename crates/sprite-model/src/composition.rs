//! Composition requests and results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, RegionSize, SourceRegion};
use crate::pixel::PixelBuffer;

/// How regions are laid out on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Left to right, top-aligned.
    Horizontal,
    /// Top to bottom, left-aligned.
    Vertical,
    /// Centered and alpha-blended; later regions on top.
    Overlay,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 3] = [
        LayoutMode::Horizontal,
        LayoutMode::Vertical,
        LayoutMode::Overlay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Horizontal => "horizontal",
            LayoutMode::Vertical => "vertical",
            LayoutMode::Overlay => "overlay",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown layout mode '{0}'. Use: horizontal, vertical, overlay")]
pub struct ParseLayoutModeError(pub String);

impl FromStr for LayoutMode {
    type Err = ParseLayoutModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(LayoutMode::Horizontal),
            "vertical" => Ok(LayoutMode::Vertical),
            "overlay" => Ok(LayoutMode::Overlay),
            _ => Err(ParseLayoutModeError(s.to_string())),
        }
    }
}

/// An ordered set of regions to combine.
///
/// Order is significant: it is the stacking order for horizontal and
/// vertical layouts and the z-order for overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRequest {
    pub regions: Vec<SourceRegion>,
    pub mode: LayoutMode,
}

impl CompositionRequest {
    pub fn new(regions: Vec<SourceRegion>, mode: LayoutMode) -> Self {
        Self { regions, mode }
    }

    /// Sizes of all requested regions, in request order.
    pub fn sizes(&self) -> Vec<RegionSize> {
        self.regions.iter().map(SourceRegion::size).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Why a region's pixels could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("source '{source_id}' unavailable: {message}")]
    SourceUnavailable { source_id: String, message: String },

    #[error("source '{source_id}' does not expose raw pixel access")]
    NotReadable { source_id: String },

    #[error("rect {rect} exceeds {width}x{height} source bounds")]
    OutOfBounds { rect: Rect, width: u32, height: u32 },

    #[error("rect {rect} covers no pixels")]
    EmptyRect { rect: Rect },

    #[error("offscreen render failed: {message}")]
    RenderFailed { message: String },

    #[error("direct read failed ({primary}); readback failed ({fallback})")]
    Exhausted {
        primary: Box<ExtractionError>,
        fallback: Box<ExtractionError>,
    },
}

/// A region that was skipped during composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFailure {
    /// Position in the request.
    pub index: usize,
    pub source_id: String,
    pub error: ExtractionError,
}

/// The outcome of one composition.
#[derive(Debug, Clone)]
pub struct CompositionResult {
    pub canvas: PixelBuffer,
    pub mode: LayoutMode,
    pub included_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<RegionFailure>,
}

impl CompositionResult {
    /// Number of regions that had an extraction attempt.
    pub fn attempted(&self) -> usize {
        self.included_count + self.skipped_count
    }

    pub fn is_partial(&self) -> bool {
        self.skipped_count > 0
    }
}
