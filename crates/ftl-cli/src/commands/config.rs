use crate::logger;
use crate::GlobalOpts;
use anyhow::Context;
use clap::Subcommand;
use colored::Colorize;
use ftl_config::{Config, KNOWN_KEYS};

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print every configured value
    Show,
    /// Set a value, e.g. `ftl config set gateway-version 0.0.14`
    Set { key: String, value: String },
    /// Print the path of the config file (override with FTL_CONFIG)
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> anyhow::Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load().context("Failed to load config")?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().context("Failed to load config")?;
            config.set(&key, value.clone())?;
            config.save().context("Failed to save config")?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path => {
            let path = Config::path()?;
            logger::debug(&format!("Known keys: {}", KNOWN_KEYS.join(", ")));
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_is_an_error() {
        let result = handle_config(
            Some(ConfigAction::Set {
                key: "no-such-key".to_string(),
                value: "x".to_string(),
            }),
            &GlobalOpts::default(),
        );
        assert!(result.is_err_and(|e| e.to_string().contains("Unknown config key")));
    }
}
