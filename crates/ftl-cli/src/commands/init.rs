use crate::logger;
use crate::GlobalOpts;
use anyhow::Context;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_FILENAME: &str = "ftl.yaml";

const APPLICATION_TEMPLATE: &str = r#"# FTL application description
# `ftl synth` turns this file into a runtime manifest.

name: my-app
version: "0.1.0"
description: "MCP tools"

# Who may call the tools:
#   public  - anyone
#   private - only you (platform login)
#   org     - members of your organization and its machine credentials
#   custom  - tokens from your own identity provider (requires auth below)
access: public

# auth:
#   jwt_issuer: "https://auth.example.com"
#   jwt_audience: "my-app"
#   jwt_required_scopes: ["tools:read"]

# Token claims every request must carry (private, org and custom access)
# required_claims:
#   role: admin

# Application variables, passed to components that ask for them
variables:
  log_level: "info"

components:
  # Built locally: path to the wasm file plus an optional build step
  - id: calculator
    source: ./calculator/target/wasm32-wasip1/release/calculator.wasm
    build:
      command: "cargo build --target wasm32-wasip1 --release"
      workdir: calculator
      watch: ["src/**/*.rs", "Cargo.toml"]

  # Pulled from a registry: namespace/name:version (ghcr.io) or host/namespace/name:version
  # - id: weather
  #   source: fastertools/weather:0.1.0
"#;

/// Write a starter application description
pub fn handle_init(filename: Option<String>, _opts: GlobalOpts) -> anyhow::Result<()> {
    logger::debug("Handling init command");

    let target_filename = filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let target_path = Path::new(&target_filename);

    logger::debug(&format!("Target file: {}", target_filename));

    if target_path.exists() {
        let should_skip = std::env::var("FTL_INIT_YES").is_ok();

        if should_skip {
            logger::debug("Skipping confirmation (FTL_INIT_YES set)");
        } else {
            print!(
                "{} File '{}' already exists. Overwrite? {} ",
                "?".bold().cyan(),
                target_filename,
                "[y/n] ›".dimmed()
            );
            let _ = io::stdout().flush();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .context("Failed to read input")?;
            let response = response.trim().to_lowercase();
            if response != "y" && response != "yes" {
                logger::info("Operation cancelled by user");
                println!("Operation cancelled.");
                return Ok(());
            }
        }
    }

    fs::write(&target_filename, APPLICATION_TEMPLATE)
        .with_context(|| format!("Failed to create application file '{}'", target_filename))?;

    logger::success(&format!("Created application file: {}", target_filename));
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} to describe your components",
        target_filename.bold()
    );
    println!("  2. Check it: ftl validate {}", target_filename);
    println!(
        "  3. Generate the manifest: ftl synth {} -o spin.toml",
        target_filename
    );
    Ok(())
}
