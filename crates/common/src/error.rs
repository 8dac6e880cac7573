//! Error types shared across spritemerge crates.

use std::path::PathBuf;

/// Top-level error type for spritemerge operations.
///
/// The first six variants are the composition taxonomy. Only
/// `ExtractionFailure` is recoverable: the pipeline records skipped regions
/// in its result and never returns this variant as `Err`. Callers convert
/// those records into it when reporting them.
#[derive(Debug, thiserror::Error)]
pub enum SpritemergeError {
    #[error("No input selected: select one or more sprites to combine")]
    NoInputSelected,

    #[error("Extraction failed for region {index}: {reason}")]
    ExtractionFailure { index: usize, reason: String },

    #[error("No usable regions: all {attempted} region(s) failed extraction")]
    NoUsableRegions { attempted: usize },

    #[error("Empty composition: cannot size a canvas for zero regions")]
    EmptyComposition,

    #[error("Canvas too large: {width}x{height}")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("Encoding error: {message}")]
    EncodingFailure { message: String },

    #[error("Persistence error: {message}")]
    PersistenceFailure { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SpritemergeError.
pub type SpritemergeResult<T> = Result<T, SpritemergeError>;

impl SpritemergeError {
    pub fn extraction(index: usize, reason: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            index,
            reason: reason.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingFailure {
            message: msg.into(),
        }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
