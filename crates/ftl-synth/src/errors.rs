//! Error taxonomy for parsing, validation and synthesis
//!
//! Parse errors come from the format adapters, validation errors name the
//! offending field path, and synthesis errors cover what can still go wrong
//! with an already validated description.

use ftl_manifest::ManifestError;
use ftl_policy::PolicyError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse CUE at line {line}, column {column}: {message}")]
    Cue {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Input does not match the application schema: {0}")]
    Schema(serde_json::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: missing required value")]
    Missing { field: String },

    #[error("{field}: invalid name '{value}' (must start with a lowercase letter and contain only lowercase letters, digits and hyphens)")]
    InvalidName { field: String, value: String },

    #[error("{field}: duplicate component id '{value}'")]
    DuplicateComponentId { field: String, value: String },

    #[error("{field}: '{value}' is reserved for a platform component")]
    ReservedComponentId { field: String, value: String },

    #[error("{field}: invalid source '{value}': {reason}")]
    InvalidSource {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field}: unknown access mode '{value}' (expected public, private, org or custom)")]
    InvalidAccessMode { field: String, value: String },

    #[error("{field}: required for custom access mode")]
    MissingCustomAuth { field: String },

    #[error("{field}: invalid variable '{value}': {reason}")]
    InvalidVariable {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field}: registry not allowed: {value}")]
    ForbiddenRegistry { field: String, value: String },

    #[error("{field}: local component sources not allowed in production")]
    LocalSourceForbidden { field: String },
}

impl ValidationError {
    /// Dotted path of the offending field, e.g. `components[1].source`
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::InvalidName { field, .. }
            | ValidationError::DuplicateComponentId { field, .. }
            | ValidationError::ReservedComponentId { field, .. }
            | ValidationError::InvalidSource { field, .. }
            | ValidationError::InvalidAccessMode { field, .. }
            | ValidationError::MissingCustomAuth { field }
            | ValidationError::InvalidVariable { field, .. }
            | ValidationError::ForbiddenRegistry { field, .. }
            | ValidationError::LocalSourceForbidden { field } => field,
        }
    }
}

/// Every problem found in one validation pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed:\n  - {}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  - ")
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("{field}: required for custom access mode")]
    MissingCustomAuth { field: &'static str },

    #[error("Failed to encode {field}: {source}")]
    Encode {
        field: &'static str,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Umbrella error for callers driving the whole pipeline
#[derive(Error, Debug)]
pub enum SynthError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
