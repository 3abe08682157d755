use anyhow::Context;
use clap::Args;
use ftl_config::Config;
use ftl_policy::{ClaimRequirements, Policy, PolicyContext, PolicyGenerator};
use ftl_synth::Format;
use std::fs;
use std::path::{Path, PathBuf};

use crate::input::{self, LoadOptions};
use crate::logger;
use crate::GlobalOpts;

pub const POLICY_FILE: &str = "policy.rego";
pub const DATA_FILE: &str = "data.json";

#[derive(Args, Debug, Clone)]
pub struct PolicyCommand {
    /// Application description; its access mode and required claims are used
    pub file: Option<String>,

    /// Input format, when it cannot be told from the file name
    #[arg(long)]
    pub format: Option<Format>,

    /// Access mode, overriding the description (public, private, org, custom)
    #[arg(long)]
    pub mode: Option<String>,

    /// Owner subject for private mode
    #[arg(long)]
    pub owner: Option<String>,

    /// Organization ID for org mode
    #[arg(long)]
    pub org_id: Option<String>,

    /// Organization member subject; repeatable
    #[arg(long = "member", value_name = "SUB")]
    pub members: Vec<String>,

    /// Write policy.rego and data.json into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Generate the Rego policy and data document for an access mode
pub fn handle_policy(cmd: PolicyCommand, _opts: &GlobalOpts) -> anyhow::Result<()> {
    // A bare `--mode` needs no description on disk
    let app = if cmd.file.is_some() || cmd.mode.is_none() {
        let config = Config::load()
            .context("Failed to load config")?
            .synthesis_config();
        Some(input::load_application(
            &LoadOptions {
                file: cmd.file.as_deref(),
                format: cmd.format,
                ..Default::default()
            },
            &config,
        )?)
    } else {
        None
    };

    let mode = match (&cmd.mode, &app) {
        (Some(mode), _) => mode.clone(),
        (None, Some(app)) => app.access.to_string(),
        (None, None) => ftl_policy::AccessMode::default().to_string(),
    };

    let members = if cmd.members.is_empty() {
        app.as_ref()
            .map(|a| a.allowed_subjects.clone())
            .unwrap_or_default()
    } else {
        cmd.members.clone()
    };

    let ctx = PolicyContext {
        owner_subject: cmd.owner.clone(),
        org_id: cmd.org_id.clone(),
        org_members: members,
        required_claims: app
            .as_ref()
            .map(|a| a.required_claims.clone())
            .unwrap_or_else(ClaimRequirements::default),
    };

    let Some(policy) = PolicyGenerator::new().generate_str(&mode, &ctx)? else {
        logger::warn(&format!("{} access has no generated policy", mode));
        return Ok(());
    };

    match &cmd.output {
        Some(dir) => {
            write_policy(dir, &policy)?;
            logger::success(&format!(
                "Wrote {} and {} to {}",
                POLICY_FILE,
                DATA_FILE,
                dir.display()
            ));
        }
        None => {
            print!("{}", policy.source);
            println!();
            println!("# {}", DATA_FILE);
            println!("{}", policy.data_json_pretty()?);
        }
    }
    Ok(())
}

fn write_policy(dir: &Path, policy: &Policy) -> anyhow::Result<()> {
    // Render before touching the filesystem
    let data = policy.data_json_pretty()?;
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    fs::write(dir.join(POLICY_FILE), &policy.source)?;
    fs::write(dir.join(DATA_FILE), format!("{}\n", data))?;
    Ok(())
}
