//! Raw description → validated [`ApplicationDescription`]
//!
//! Validation never stops at the first problem: every error is collected
//! with its field path so users can fix a description in one pass.

use ftl_config::SynthesisConfig;
use ftl_policy::{AccessMode, ClaimRequirements};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::errors::{ValidationError, ValidationErrors};
use crate::schema::{
    ApplicationDescription, AuthConfig, BuildConfig, Component, RawApplication, RawAuth,
    RawComponent, DEFAULT_VERSION,
};
use crate::source;

static NAME_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").ok());
static VARIABLE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").ok());

fn pattern_matches(pattern: &Lazy<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

pub fn is_valid_name(value: &str) -> bool {
    pattern_matches(&NAME_PATTERN, value)
}

pub fn is_valid_variable_name(value: &str) -> bool {
    pattern_matches(&VARIABLE_PATTERN, value)
}

/// Present and not blank, kept exactly as written
fn present(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Validate and normalize a raw description
pub fn validate(
    raw: &RawApplication,
    config: &SynthesisConfig,
) -> Result<ApplicationDescription, ValidationErrors> {
    let mut errors: Vec<ValidationError> = Vec::new();

    if !raw.extra.is_empty() {
        let fields: Vec<&String> = raw.extra.keys().collect();
        warn!(?fields, "Dropping fields outside the application schema");
    }

    let name = match present(raw.name.as_ref()) {
        Some(name) if is_valid_name(&name) => name,
        Some(name) => {
            errors.push(ValidationError::InvalidName {
                field: "name".to_string(),
                value: name,
            });
            String::new()
        }
        None => {
            errors.push(ValidationError::Missing {
                field: "name".to_string(),
            });
            String::new()
        }
    };

    let version = non_empty(raw.version.as_ref()).unwrap_or_else(|| DEFAULT_VERSION.to_string());

    let access = match non_empty(raw.access.as_ref()) {
        None => AccessMode::default(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            errors.push(ValidationError::InvalidAccessMode {
                field: "access".to_string(),
                value,
            });
            AccessMode::default()
        }),
    };

    let auth = raw.auth.as_ref().map(auth_config);
    if access == AccessMode::Custom {
        let auth = auth.clone().unwrap_or_default();
        if auth.jwt_issuer.is_none() {
            errors.push(ValidationError::MissingCustomAuth {
                field: "auth.jwt_issuer".to_string(),
            });
        }
        if auth.jwt_audience.is_none() {
            errors.push(ValidationError::MissingCustomAuth {
                field: "auth.jwt_audience".to_string(),
            });
        }
    }

    for (index, subject) in raw.allowed_subjects.iter().enumerate() {
        if subject.trim().is_empty() {
            errors.push(ValidationError::Missing {
                field: format!("allowed_subjects[{}]", index),
            });
        }
    }

    let variables = validate_variables(&raw.variables, "variables", &mut errors);

    let reserved = config.reserved_ids();
    let mut seen = HashSet::new();
    let mut components = Vec::with_capacity(raw.components.len());
    for (index, raw_component) in raw.components.iter().enumerate() {
        if let Some(component) = validate_component(
            raw_component,
            index,
            config,
            &reserved,
            &mut seen,
            &mut errors,
        ) {
            components.push(component);
        }
    }

    if !errors.is_empty() {
        debug!("Validation found {} error(s)", errors.len());
        return Err(ValidationErrors(errors));
    }

    Ok(ApplicationDescription {
        name,
        version,
        description: non_empty(raw.description.as_ref()),
        access,
        auth,
        required_claims: ClaimRequirements::new(raw.required_claims.clone()),
        allowed_subjects: raw
            .allowed_subjects
            .iter()
            .map(|s| s.trim().to_string())
            .collect(),
        variables,
        components,
    })
}

fn auth_config(raw: &RawAuth) -> AuthConfig {
    AuthConfig {
        jwt_issuer: non_empty(raw.jwt_issuer.as_ref()),
        jwt_audience: non_empty(raw.jwt_audience.as_ref()),
        jwt_jwks_uri: non_empty(raw.jwt_jwks_uri.as_ref()),
        jwt_required_scopes: raw
            .jwt_required_scopes
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        policy: non_empty(raw.policy.as_ref()),
        policy_data: raw.policy_data.clone(),
    }
}

fn validate_component(
    raw: &RawComponent,
    index: usize,
    config: &SynthesisConfig,
    reserved: &[&str],
    seen: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) -> Option<Component> {
    let prefix = format!("components[{}]", index);
    let error_count = errors.len();

    let id = match present(raw.id.as_ref()) {
        Some(id) if !is_valid_name(&id) => {
            errors.push(ValidationError::InvalidName {
                field: format!("{}.id", prefix),
                value: id.clone(),
            });
            id
        }
        Some(id) if reserved.contains(&id.as_str()) => {
            errors.push(ValidationError::ReservedComponentId {
                field: format!("{}.id", prefix),
                value: id.clone(),
            });
            id
        }
        Some(id) => {
            if !seen.insert(id.clone()) {
                errors.push(ValidationError::DuplicateComponentId {
                    field: format!("{}.id", prefix),
                    value: id.clone(),
                });
            }
            id
        }
        None => {
            errors.push(ValidationError::Missing {
                field: format!("{}.id", prefix),
            });
            String::new()
        }
    };

    if !raw.extra.is_empty() {
        let fields: Vec<&String> = raw.extra.keys().collect();
        warn!(component = %id, ?fields, "Dropping fields outside the component schema");
    }

    let source = match raw.source.as_ref() {
        Some(raw_source) => match source::normalize(raw_source, &config.default_registry) {
            Ok(source) => Some(source),
            Err(reason) => {
                errors.push(ValidationError::InvalidSource {
                    field: format!("{}.source", prefix),
                    value: describe_raw_source(raw_source),
                    reason: reason.to_string(),
                });
                None
            }
        },
        None => {
            errors.push(ValidationError::Missing {
                field: format!("{}.source", prefix),
            });
            None
        }
    };

    let build = raw.build.as_ref().and_then(|b| match non_empty(b.command.as_ref()) {
        Some(command) => Some(BuildConfig {
            command,
            workdir: non_empty(b.workdir.as_ref()),
            watch: b.watch.clone(),
        }),
        None => {
            debug!("{}.build has no command, skipping build step", prefix);
            None
        }
    });

    let variables = validate_variables(&raw.variables, &format!("{}.variables", prefix), errors);

    if errors.len() > error_count {
        return None;
    }

    Some(Component {
        id,
        source: source?,
        build,
        variables,
    })
}

fn describe_raw_source(raw: &crate::schema::RawSource) -> String {
    match raw {
        crate::schema::RawSource::Reference(reference) => reference.clone(),
        crate::schema::RawSource::Registry {
            registry,
            package,
            version,
        } => format!(
            "{{registry: {}, package: {}, version: {}}}",
            registry.as_deref().unwrap_or(""),
            package.as_deref().unwrap_or(""),
            version.as_deref().unwrap_or("")
        ),
    }
}

fn validate_variables(
    raw: &BTreeMap<String, Value>,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();
    for (name, value) in raw {
        if !is_valid_variable_name(name) {
            errors.push(ValidationError::InvalidVariable {
                field: field.to_string(),
                value: name.clone(),
                reason: "names must start with a lowercase letter and contain only \
                         lowercase letters, digits and underscores"
                    .to_string(),
            });
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                errors.push(ValidationError::InvalidVariable {
                    field: field.to_string(),
                    value: name.clone(),
                    reason: "value must be a string, number or boolean".to_string(),
                });
                continue;
            }
        };
        variables.insert(name.clone(), rendered);
    }
    variables
}
