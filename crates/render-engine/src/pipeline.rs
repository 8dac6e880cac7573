//! The combine pipeline: extract, size, compose, encode, persist.

use std::collections::HashMap;
use std::path::PathBuf;

use spritemerge_common::error::{SpritemergeError, SpritemergeResult};
use spritemerge_sprite_model::{
    CompositionRequest, CompositionResult, ExtractionError, RegionFailure,
};

use crate::compositor::{compose, RegionSlot};
use crate::encoder::encode_png;
use crate::extract::{
    ReadabilityControl, ReadabilityLease, RegionExtractor, SourceImage, SourceLibrary,
};
use crate::persist::{suggest_name, SpriteSink};

/// A composition that was encoded and stored.
#[derive(Debug, Clone)]
pub struct SavedComposition {
    pub path: PathBuf,
    pub result: CompositionResult,
}

/// Runs compositions against a source library.
pub struct Combiner<'a> {
    library: &'a dyn SourceLibrary,
    readability: Option<&'a dyn ReadabilityControl>,
    extractor: RegionExtractor,
}

impl<'a> Combiner<'a> {
    pub fn new(library: &'a dyn SourceLibrary) -> Self {
        Self {
            library,
            readability: None,
            extractor: RegionExtractor::default(),
        }
    }

    /// Allow sources to be made readable for the duration of a combine.
    pub fn with_readability(mut self, control: &'a dyn ReadabilityControl) -> Self {
        self.readability = Some(control);
        self
    }

    pub fn with_extractor(mut self, extractor: RegionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extract every region and compose the canvas.
    ///
    /// Regions that cannot be extracted are skipped and reported in the
    /// result. Readability changes are undone before this returns, on
    /// success and on error alike.
    pub fn combine(&self, request: &CompositionRequest) -> SpritemergeResult<CompositionResult> {
        if request.is_empty() {
            return Err(SpritemergeError::NoInputSelected);
        }

        tracing::info!(
            regions = request.regions.len(),
            mode = %request.mode,
            "Combining sprites"
        );

        let (slots, errors) = self.extract_all(request);
        let composition = compose(&slots, request.mode)?;

        tracing::info!(
            width = composition.canvas.width(),
            height = composition.canvas.height(),
            included = composition.included,
            skipped = composition.skipped,
            "Composition complete"
        );

        Ok(CompositionResult {
            canvas: composition.canvas,
            mode: request.mode,
            included_count: composition.included,
            skipped_count: composition.skipped,
            errors,
        })
    }

    fn extract_all(&self, request: &CompositionRequest) -> (Vec<RegionSlot>, Vec<RegionFailure>) {
        let mut lease = match self.readability {
            Some(control) => ReadabilityLease::new(control),
            None => ReadabilityLease::disabled(),
        };
        let mut opened: HashMap<&str, Result<Box<dyn SourceImage>, ExtractionError>> =
            HashMap::new();
        let mut slots = Vec::with_capacity(request.regions.len());
        let mut errors = vec![];

        for (index, region) in request.regions.iter().enumerate() {
            let id = region.source_id.as_str();
            let source = opened.entry(id).or_insert_with(|| {
                lease.request(id);
                self.library.open(id)
            });

            let extracted = match source {
                Ok(source) => self.extractor.extract(&**source, region.rect),
                Err(e) => Err(e.clone()),
            };

            match extracted {
                Ok(pixels) => slots.push(RegionSlot {
                    size: region.size(),
                    pixels: Some(pixels),
                }),
                Err(error) => {
                    tracing::warn!(
                        region = index,
                        source = id,
                        rect = %region.rect,
                        %error,
                        "Skipping region"
                    );
                    slots.push(RegionSlot::failed(region.size()));
                    errors.push(RegionFailure {
                        index,
                        source_id: id.to_string(),
                        error,
                    });
                }
            }
        }

        (slots, errors)
    }

    /// Combine, encode, and hand the bytes to `sink`.
    ///
    /// Nothing reaches the sink unless composition and encoding succeed.
    pub fn combine_and_save(
        &self,
        request: &CompositionRequest,
        sink: &dyn SpriteSink,
        name_prefix: &str,
    ) -> SpritemergeResult<SavedComposition> {
        let result = self.combine(request)?;
        let bytes = encode_png(&result.canvas)?;
        let name = suggest_name(name_prefix, &chrono::Local::now());
        let path = sink.persist(&bytes, &name)?;
        Ok(SavedComposition { path, result })
    }
}

/// Skipped regions of `result` as `ExtractionFailure` errors, for reporting.
pub fn region_errors(result: &CompositionResult) -> Vec<SpritemergeError> {
    result
        .errors
        .iter()
        .map(|f| SpritemergeError::extraction(f.index, format!("{}: {}", f.source_id, f.error)))
        .collect()
}
