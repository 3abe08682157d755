//! Component source normalization
//!
//! Accepted reference strings:
//! - local paths: `./x.wasm`, `../x.wasm`, `/abs/x.wasm`, or anything ending in `.wasm`
//! - OCI style: `namespace/name:version` (default registry) or
//!   `host/namespace[/...]/name:version`
//! - wkg style: `host/namespace:name@version`
//!
//! Structured `{registry, package, version}` triples pass through unchanged.

use thiserror::Error;
use tracing::debug;

use crate::schema::{ComponentSource, RawSource};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("source is empty")]
    Empty,

    #[error("registry source is missing '{0}'")]
    IncompleteRegistry(&'static str),

    #[error("registry reference has an empty path segment")]
    EmptySegment,

    #[error("registry reference requires a version (namespace/name:version)")]
    MissingVersion,

    #[error("registry reference requires a namespace and a name")]
    MissingPackage,

    #[error("not a local path or registry reference")]
    Ambiguous,
}

const LOCAL_PREFIXES: [&str; 3] = ["./", "../", "/"];
const LOCAL_EXTENSION: &str = ".wasm";

pub fn normalize(raw: &RawSource, default_registry: &str) -> Result<ComponentSource, SourceError> {
    match raw {
        RawSource::Reference(reference) => parse_reference(reference, default_registry),
        RawSource::Registry {
            registry,
            package,
            version,
        } => Ok(ComponentSource::Registry {
            registry: required(registry.as_deref(), "registry")?,
            package: required(package.as_deref(), "package")?,
            version: required(version.as_deref(), "version")?,
        }),
    }
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, SourceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(SourceError::IncompleteRegistry(field)),
    }
}

/// Classify a reference string as a local path or a registry package
pub fn parse_reference(
    reference: &str,
    default_registry: &str,
) -> Result<ComponentSource, SourceError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(SourceError::Empty);
    }

    if LOCAL_PREFIXES.iter().any(|p| reference.starts_with(p))
        || reference.ends_with(LOCAL_EXTENSION)
    {
        debug!("Source '{}' is a local path", reference);
        return Ok(ComponentSource::Local {
            path: reference.to_string(),
        });
    }

    if !reference.contains('/') {
        return Err(SourceError::Ambiguous);
    }

    if let Some(source) = parse_wkg(reference)? {
        return Ok(source);
    }

    parse_oci(reference, default_registry)
}

/// `host/namespace:name@version`
fn parse_wkg(reference: &str) -> Result<Option<ComponentSource>, SourceError> {
    let Some((main, version)) = reference.rsplit_once('@') else {
        return Ok(None);
    };
    let Some((host, package)) = main.split_once('/') else {
        return Ok(None);
    };
    let Some((namespace, name)) = package.split_once(':') else {
        return Ok(None);
    };

    if host.is_empty() {
        return Err(SourceError::EmptySegment);
    }
    if namespace.is_empty() || name.is_empty() {
        return Err(SourceError::MissingPackage);
    }
    if version.is_empty() {
        return Err(SourceError::MissingVersion);
    }

    Ok(Some(ComponentSource::Registry {
        registry: host.to_string(),
        package: package.to_string(),
        version: version.to_string(),
    }))
}

/// `[host/]namespace/.../name:version`
fn parse_oci(reference: &str, default_registry: &str) -> Result<ComponentSource, SourceError> {
    let last_segment = reference.rsplit('/').next().unwrap_or(reference);
    if !last_segment.contains(':') {
        return Err(SourceError::MissingVersion);
    }

    let Some((path, version)) = reference.rsplit_once(':') else {
        return Err(SourceError::MissingVersion);
    };
    if version.is_empty() {
        return Err(SourceError::MissingVersion);
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SourceError::EmptySegment);
    }

    let (registry, namespace, name) = match segments.as_slice() {
        [namespace, name] => (default_registry.to_string(), namespace.to_string(), *name),
        [host, middle @ .., name] if !middle.is_empty() => {
            (host.to_string(), middle.join("/"), *name)
        }
        _ => return Err(SourceError::MissingPackage),
    };

    Ok(ComponentSource::Registry {
        registry,
        package: format!("{}:{}", namespace, name),
        version: version.to_string(),
    })
}
