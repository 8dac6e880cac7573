//! Write a new combine manifest.

use std::path::PathBuf;

use spritemerge_sprite_model::{CombineManifest, LayoutMode, LoadedManifest};

use super::parse_region_arg;

pub fn run(name: String, mode: String, output: PathBuf, regions: Vec<String>) -> anyhow::Result<()> {
    let mode: LayoutMode = mode.parse()?;
    let path = output.join(format!("{name}.json"));
    println!("Creating manifest '{}' at {}", name, path.display());

    let mut manifest = CombineManifest::new(&name, mode);
    for arg in &regions {
        let (source, rect) = parse_region_arg(arg)?;
        manifest.push(source, rect);
    }

    let loaded = LoadedManifest { path, manifest };
    loaded
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to write manifest: {e}"))?;

    println!("Manifest created:");
    println!("  Mode: {mode}");
    println!("  Regions: {}", loaded.manifest.regions.len());
    println!();
    println!("Combine it with:");
    println!("  spritemerge {mode} --manifest {}", loaded.path.display());

    Ok(())
}
