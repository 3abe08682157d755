//! Errors surfaced by `ftl` commands

use ftl_config::ConfigError;
use ftl_policy::PolicyError;
use ftl_synth::{ParseError, SynthError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No ftl.yaml, ftl.yml, ftl.json or ftl.cue found in {0}")]
    NoInputFound(PathBuf),

    #[error("Cannot tell the format of '{0}'; pass --format yaml|json|cue")]
    UnknownFormat(PathBuf),

    #[error("Invalid variable '{0}', expected KEY=VALUE")]
    InvalidVariable(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
