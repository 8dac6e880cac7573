//! Validate a combine manifest.

use std::path::PathBuf;

use spritemerge_sprite_model::LoadedManifest;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating manifest at: {}", path.display());

    let loaded =
        LoadedManifest::load(&path).map_err(|e| anyhow::anyhow!("Failed to load manifest: {e}"))?;

    println!("  Name: {}", loaded.manifest.name);
    println!("  Version: {}", loaded.manifest.version);
    println!("  Mode: {}", loaded.manifest.mode);
    println!("  Regions: {}", loaded.manifest.regions.len());

    let errors = loaded.validate();
    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nManifest is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Affected regions will be skipped.",
            errors.len()
        );
    }

    Ok(())
}
