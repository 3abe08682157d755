//! Locating and loading application descriptions

use ftl_config::SynthesisConfig;
use ftl_synth::formats::{self, Format};
use ftl_synth::{compose, validator, ApplicationDescription, RawApplication, SynthError};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::errors::CliError;
use crate::logger;

/// Argument value meaning "read from stdin"
pub const STDIN: &str = "-";

/// Raw text of a description and where it came from
#[derive(Debug, Clone)]
pub struct Description {
    /// `None` for stdin
    pub path: Option<PathBuf>,
    pub format: Format,
    pub content: String,
}

impl Description {
    pub fn label(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
    }

    pub fn parse(&self) -> Result<RawApplication, CliError> {
        Ok(formats::parse(&self.content, self.format)?)
    }
}

/// First description file in `dir`, in search order
pub fn find_in_dir(dir: &Path) -> Option<(PathBuf, Format)> {
    Format::SEARCH_ORDER
        .iter()
        .map(|(name, format)| (dir.join(name), *format))
        .find(|(path, _)| path.is_file())
}

/// `ftl` → `ftl.yaml`, `ftl.yml`, `ftl.json`, `ftl.cue`, whichever exists
fn resolve_fallback_path(original: &Path) -> Option<PathBuf> {
    if original.extension().is_some() {
        return None;
    }
    ["yaml", "yml", "json", "cue"]
        .iter()
        .map(|ext| original.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

fn read_path(path: &Path, format: Option<Format>) -> Result<Description, CliError> {
    let path = if path.exists() {
        path.to_path_buf()
    } else {
        resolve_fallback_path(path).unwrap_or_else(|| path.to_path_buf())
    };

    let content = fs::read_to_string(&path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    let format = match format.or_else(|| Format::from_extension(&path)) {
        Some(format) => format,
        None => return Err(CliError::UnknownFormat(path)),
    };

    logger::debug(&format!("Reading {} description from {}", format, path.display()));
    Ok(Description {
        path: Some(path),
        format,
        content,
    })
}

fn read_stdin(format: Option<Format>) -> Result<Description, CliError> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    let format = format.unwrap_or_else(|| Format::detect(&content));
    logger::debug(&format!("Reading {} description from stdin", format));
    Ok(Description {
        path: None,
        format,
        content,
    })
}

/// Read the description named on the command line, or search the current
/// directory when none was given.
pub fn read_description(
    file: Option<&str>,
    format: Option<Format>,
) -> Result<Description, CliError> {
    match file {
        Some(STDIN) => read_stdin(format),
        Some(path) => read_path(Path::new(path), format),
        None => {
            let cwd = std::env::current_dir()?;
            let (path, found) = find_in_dir(&cwd).ok_or(CliError::NoInputFound(cwd))?;
            read_path(&path, Some(format.unwrap_or(found)))
        }
    }
}

/// Parse `KEY=VALUE` pairs
pub fn parse_vars(vars: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    vars.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(CliError::InvalidVariable(pair.clone())),
        })
        .collect()
}

/// Everything needed to turn command-line inputs into a validated description
#[derive(Debug, Clone, Default)]
pub struct LoadOptions<'a> {
    pub file: Option<&'a str>,
    pub format: Option<Format>,
    pub overlays: &'a [PathBuf],
    pub vars: &'a [String],
}

pub fn load_application(
    options: &LoadOptions<'_>,
    config: &SynthesisConfig,
) -> Result<ApplicationDescription, CliError> {
    let base = read_description(options.file, options.format)?;
    logger::step(&format!("Parsing {}", base.label()));
    let raw = base.parse()?;

    let overlays = options
        .overlays
        .iter()
        .map(|path| read_path(path, None).and_then(|d| d.parse()))
        .collect::<Result<Vec<_>, _>>()?;
    let vars = parse_vars(options.vars)?;

    let merged = compose::merge(raw, &overlays, &vars);
    logger::step("Validating description");
    validator::validate(&merged, config).map_err(|e| CliError::Synth(SynthError::from(e)))
}

/// Write to `path`, or stdout when absent
pub fn write_output(path: Option<&Path>, content: &str) -> Result<(), CliError> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_search_order_prefers_yaml() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let _ = fs::write(dir.path().join("ftl.json"), "{}");
        let _ = fs::write(dir.path().join("ftl.yaml"), "name: demo\n");
        let found = find_in_dir(dir.path());
        assert_eq!(found.map(|(_, f)| f), Some(Format::Yaml));
    }

    #[test]
    fn test_search_finds_cue() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let _ = fs::write(dir.path().join("ftl.cue"), "package ftl\n");
        assert_eq!(find_in_dir(dir.path()).map(|(_, f)| f), Some(Format::Cue));
    }

    #[test]
    fn test_extension_fallback() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let _ = fs::write(dir.path().join("app.json"), "{\"name\": \"demo\"}");
        let result = read_path(&dir.path().join("app"), None);
        assert!(result.is_ok_and(|d| d.format == Format::Json));
    }

    #[test]
    fn test_unknown_extension() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("app.txt");
        let _ = fs::write(&path, "name: demo\n");
        assert!(matches!(read_path(&path, None), Err(CliError::UnknownFormat(_))));
        assert!(read_path(&path, Some(Format::Yaml)).is_ok());
    }

    #[test]
    fn test_parse_vars() {
        let vars = vec!["region=eu".to_string(), "url=http://x?a=b".to_string()];
        let parsed = parse_vars(&vars);
        assert!(parsed.is_ok_and(|m| m.get("url").map(String::as_str) == Some("http://x?a=b")
            && m.get("region").map(String::as_str) == Some("eu")));
        assert!(parse_vars(&["novalue".to_string()]).is_err());
        assert!(parse_vars(&["=x".to_string()]).is_err());
    }
}
