//! spritemerge Sprite Model
//!
//! Defines the core data contracts for sprite composition:
//! - **Geometry:** Source rectangles and region sizes
//! - **Pixels:** Non-premultiplied RGBA8 buffers, row-major, top-left origin
//! - **Composition:** Layout modes, requests, and results
//! - **Import settings:** Per-image sidecar flags (readability, filtering)
//! - **Manifest:** Serializable combine requests (`*.json`)
//!
//! All coordinates are in source pixels with `(0, 0)` at the top-left.

pub mod composition;
pub mod geometry;
pub mod import;
pub mod manifest;
pub mod pixel;

pub use composition::*;
pub use geometry::*;
pub use import::*;
pub use manifest::*;
pub use pixel::*;
