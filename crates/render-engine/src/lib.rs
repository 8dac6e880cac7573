//! spritemerge Render Engine
//!
//! Combines rectangular regions cropped from source images into a single
//! RGBA sprite laid out horizontally, vertically, or as a centered overlay.
//!
//! # Pipeline Architecture
//!
//! ```text
//! request ──┬── RegionExtractor ── direct read ─┐
//!           │        (per region)  └ readback ──┤
//!           │                                   ▼
//!           └── canvas_size ──────────────► compose
//!                                               │
//!                                               ▼
//!                                         encode_png
//!                                               │
//!                                               ▼
//!                                     SpriteSink::persist
//! ```

pub mod compositor;
pub mod encoder;
pub mod extract;
pub mod library;
pub mod persist;
pub mod pipeline;
pub mod sizer;

pub use compositor::{compose, BlendMode, Composition, RegionSlot};
pub use encoder::{decode_png, encode_png};
pub use extract::{
    ReadabilityControl, ReadabilityLease, RegionExtractor, SourceImage, SourceLibrary,
    SurfacePool,
};
pub use library::{FileLibrary, MemoryLibrary, MemorySource};
pub use persist::{suggest_name, DirectorySink, SpriteSink};
pub use pipeline::{region_errors, Combiner, SavedComposition};
pub use sizer::canvas_size;
