use anyhow::Context;
use clap::Args;
use colored::Colorize;
use ftl_config::Config;
use ftl_synth::formats;
use ftl_synth::Format;

use crate::input::{self, LoadOptions};
use crate::logger;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct ValidateCommand {
    /// Application description; `-` reads stdin
    pub file: Option<String>,

    /// Input format, when it cannot be told from the file name
    #[arg(long)]
    pub format: Option<Format>,

    /// Print the normalized description as YAML
    #[arg(long)]
    pub print: bool,
}

pub fn handle_validate(cmd: ValidateCommand, opts: &GlobalOpts) -> anyhow::Result<()> {
    let config = Config::load()
        .context("Failed to load config")?
        .synthesis_config();

    let app = input::load_application(
        &LoadOptions {
            file: cmd.file.as_deref(),
            format: cmd.format,
            ..Default::default()
        },
        &config,
    )?;

    logger::success(&format!(
        "{} v{} is valid ({} components, {} access)",
        app.name.bold(),
        app.version,
        app.components.len(),
        app.access
    ));

    if opts.verbosity_level() > 0 {
        for component in &app.components {
            logger::info(&format!("  {} {}", component.id.cyan(), component.source));
        }
    }

    if cmd.print {
        let normalized = formats::render(&app, Format::Yaml)?;
        print!("{}", normalized);
    }
    Ok(())
}
