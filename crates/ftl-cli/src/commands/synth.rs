use anyhow::Context;
use clap::Args;
use ftl_config::Config;
use ftl_synth::{Format, Synthesizer};
use std::fs;
use std::path::PathBuf;

use crate::input::{self, LoadOptions};
use crate::logger;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct SynthCommand {
    /// Application description (ftl.yaml, ftl.json, ftl.cue); `-` reads stdin
    pub file: Option<String>,

    /// Write the manifest here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Input format, when it cannot be told from the file name
    #[arg(long)]
    pub format: Option<Format>,

    /// Description layered over the input; repeatable, later wins
    #[arg(long = "overlay", value_name = "FILE")]
    pub overlays: Vec<PathBuf>,

    /// Application variable; repeatable, wins over every file
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,
}

/// Render the runtime manifest for a description
pub fn handle_synth(cmd: SynthCommand, _opts: &GlobalOpts) -> anyhow::Result<()> {
    let config = Config::load()
        .context("Failed to load config")?
        .synthesis_config();

    let app = input::load_application(
        &LoadOptions {
            file: cmd.file.as_deref(),
            format: cmd.format,
            overlays: &cmd.overlays,
            vars: &cmd.vars,
        },
        &config,
    )?;

    logger::step(&format!("Synthesizing manifest for {}", app.name));
    let manifest = Synthesizer::new(config)
        .synthesize(&app)
        .with_context(|| format!("Failed to synthesize manifest for '{}'", app.name))?;

    match &cmd.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            ftl_manifest::write_to_path(&manifest, path)?;
            logger::success(&format!(
                "Wrote manifest for {} ({} components) to {}",
                app.name,
                manifest.components.len(),
                path.display()
            ));
        }
        None => input::write_output(None, &manifest.to_toml_string()?)?,
    }
    Ok(())
}
