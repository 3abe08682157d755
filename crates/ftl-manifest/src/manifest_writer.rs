//! Helpers for writing/reading manifests to/from disk
//!
//! Synthesis itself never touches the filesystem; these are used by the CLI
//! `-o` flag and by tests that verify a written manifest.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::types::Manifest;

/// Render and write a manifest. Rendering happens before the file is
/// opened, so a failed render leaves no partial output behind.
pub fn write_to_path(manifest: &Manifest, output_path: &Path) -> Result<()> {
    debug!("Writing manifest to: {:?}", output_path);

    let toml_string = manifest.to_toml_string()?;
    fs::write(output_path, &toml_string)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("Manifest written to: {:?}", output_path);
    info!("Total components: {}", manifest.components.len());

    Ok(())
}

pub fn read_from_path(manifest_path: &Path) -> Result<Manifest> {
    debug!("Reading manifest from: {:?}", manifest_path);

    let content = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest = Manifest::from_toml_str(&content)?;

    info!("Manifest loaded: {}", manifest.application.name);
    info!("Total components: {}", manifest.components.len());

    Ok(manifest)
}
