//! Show what a manifest combines.

use std::path::PathBuf;

use spritemerge_render_engine::{canvas_size, FileLibrary, ReadabilityControl};
use spritemerge_sprite_model::LoadedManifest;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let loaded =
        LoadedManifest::load(&path).map_err(|e| anyhow::anyhow!("Failed to load manifest: {e}"))?;
    let library = FileLibrary::new("");
    let request = loaded.to_request(|p| library.dimensions(&p.to_string_lossy()));

    println!("Manifest: {}", loaded.manifest.name);
    println!("  Mode: {}", request.mode);
    println!();

    println!("Regions:");
    for (i, region) in request.regions.iter().enumerate() {
        let readable = match library.is_readable(&region.source_id) {
            Ok(true) => "readable",
            Ok(false) => "not readable",
            Err(_) => "unknown",
        };
        let image = match library.dimensions(&region.source_id) {
            Some((w, h)) => format!("{w}x{h}"),
            None => "missing".to_string(),
        };
        println!(
            "  [{i}] {} @ {} (image {image}, {readable})",
            region.source_id, region.rect
        );
    }
    println!();

    match canvas_size(&request.sizes(), request.mode) {
        Ok((w, h)) => println!("Output canvas: {w}x{h}"),
        Err(e) => println!("Output canvas: unavailable ({e})"),
    }

    Ok(())
}
