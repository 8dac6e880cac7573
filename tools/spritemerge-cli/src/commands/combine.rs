//! Combine regions into one sprite.

use std::path::Path;

use spritemerge_common::config::AppConfig;
use spritemerge_render_engine::{region_errors, Combiner, DirectorySink, FileLibrary};
use spritemerge_sprite_model::{
    CompositionRequest, LayoutMode, LoadedManifest, ManifestRegion, SourceRegion,
};

use super::parse_region_arg;
use crate::CombineArgs;

pub fn run(mode: LayoutMode, args: CombineArgs, config: &AppConfig) -> anyhow::Result<()> {
    let library = FileLibrary::new("");
    let dimensions = |path: &Path| library.dimensions(&path.to_string_lossy());

    let mut regions: Vec<SourceRegion> = vec![];
    let mut prefix = args.prefix.clone();

    if let Some(path) = &args.manifest {
        let loaded = LoadedManifest::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load manifest: {e}"))?;
        if loaded.manifest.mode != mode {
            println!(
                "Note: manifest mode '{}' overridden by '{mode}'",
                loaded.manifest.mode
            );
        }
        if prefix.is_none() && !loaded.manifest.name.is_empty() {
            prefix = Some(loaded.manifest.name.clone());
        }
        regions.extend(loaded.to_request(dimensions).regions);
    }

    for arg in &args.regions {
        let (source, rect) = parse_region_arg(arg)?;
        regions.push(ManifestRegion { source, rect }.resolve(Path::new(""), dimensions));
    }

    let request = CompositionRequest::new(regions, mode);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let prefix = prefix.unwrap_or_else(|| config.file_prefix.clone());
    tracing::debug!(
        output_dir = %output_dir.display(),
        prefix = %prefix,
        toggle = config.toggle_readability && !args.no_toggle,
        "Resolved output settings"
    );

    println!("Combining {} region(s) ({mode})", request.regions.len());
    for (i, region) in request.regions.iter().enumerate() {
        println!("  [{i}] {} @ {}", region.source_id, region.rect);
    }

    let mut combiner = Combiner::new(&library);
    if config.toggle_readability && !args.no_toggle {
        combiner = combiner.with_readability(&library);
    }
    let sink = DirectorySink::new(&output_dir);

    let saved = combiner
        .combine_and_save(&request, &sink, &prefix)
        .map_err(|e| anyhow::anyhow!("Combine failed: {e}"))?;

    let result = &saved.result;
    println!(
        "\nCombined {} sprites -> {} ({}x{})",
        result.included_count,
        saved.path.display(),
        result.canvas.width(),
        result.canvas.height()
    );
    if result.is_partial() {
        println!("Skipped {} region(s):", result.skipped_count);
        for error in region_errors(result) {
            println!("  {error}");
        }
    }

    Ok(())
}
