//! Format adapters
//!
//! Each adapter turns text into the same [`RawApplication`] and renders a
//! validated description back into its own syntax.

pub mod cue;

use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::errors::ParseError;
use crate::schema::{ApplicationDescription, RawApplication};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Yaml,
    Json,
    Cue,
}

impl Format {
    /// Lookup order when searching a directory for a description
    pub const SEARCH_ORDER: [(&'static str, Format); 4] = [
        ("ftl.yaml", Format::Yaml),
        ("ftl.yml", Format::Yaml),
        ("ftl.json", Format::Json),
        ("ftl.cue", Format::Cue),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Cue => "cue",
        }
    }

    pub fn from_extension(path: &Path) -> Option<Format> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "cue" => Some(Format::Cue),
            _ => None,
        }
    }

    /// Guess the format of unnamed input such as stdin
    pub fn detect(content: &str) -> Format {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            Format::Json
        } else if trimmed.starts_with("package ") || trimmed.starts_with("//") {
            Format::Cue
        } else {
            Format::Yaml
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            "cue" => Ok(Format::Cue),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub fn parse(content: &str, format: Format) -> Result<RawApplication, ParseError> {
    debug!("Parsing {} input ({} bytes)", format, content.len());
    match format {
        Format::Yaml => Ok(serde_yaml::from_str(content)?),
        Format::Json => Ok(serde_json::from_str(content)?),
        Format::Cue => {
            let value = cue::parse(content)?;
            serde_json::from_value(value).map_err(ParseError::Schema)
        }
    }
}

pub fn render(app: &ApplicationDescription, format: Format) -> Result<String, ParseError> {
    let raw = app.to_raw();
    match format {
        Format::Yaml => Ok(serde_yaml::to_string(&raw)?),
        Format::Json => {
            let mut out = serde_json::to_string_pretty(&raw)?;
            out.push('\n');
            Ok(out)
        }
        Format::Cue => {
            let value: Value = serde_json::to_value(&raw)?;
            Ok(cue::render(&value))
        }
    }
}
