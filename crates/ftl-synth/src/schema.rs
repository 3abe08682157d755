//! Application description types
//!
//! `Raw*` types mirror what users write in YAML, JSON or CUE: every field is
//! optional and unknown fields are collected so they can be reported and
//! dropped. The validator turns a [`RawApplication`] into an
//! [`ApplicationDescription`], the only form synthesis accepts.

use ftl_policy::{AccessMode, ClaimRequirements};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_VERSION: &str = "0.1.0";

// =============================================================================
// RAW INPUT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawApplication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<RawAuth>,
    #[serde(
        default,
        alias = "requiredClaims",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub required_claims: BTreeMap<String, Value>,
    #[serde(
        default,
        alias = "allowedSubjects",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<RawComponent>,
    /// Fields outside the schema; reported and never copied anywhere
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RawSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<RawBuild>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, Value>,
    /// Anything else, including capability grants that only the platform may set
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A source as written: a reference string or an explicit registry triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSource {
    Reference(String),
    Registry {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        registry: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBuild {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watch: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_jwks_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jwt_required_scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_data: Option<Value>,
}

// =============================================================================
// VALIDATED DESCRIPTION
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDescription {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub access: AccessMode,
    pub auth: Option<AuthConfig>,
    pub required_claims: ClaimRequirements,
    pub allowed_subjects: Vec<String>,
    pub variables: BTreeMap<String, String>,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: String,
    pub source: ComponentSource,
    pub build: Option<BuildConfig>,
    pub variables: BTreeMap<String, String>,
}

/// Normalized component source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentSource {
    Local {
        path: String,
    },
    Registry {
        registry: String,
        package: String,
        version: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub command: String,
    pub workdir: Option<String>,
    pub watch: Vec<String>,
}

/// Token validation settings; only consulted for `custom` access
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthConfig {
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub jwt_jwks_uri: Option<String>,
    pub jwt_required_scopes: Vec<String>,
    pub policy: Option<String>,
    pub policy_data: Option<Value>,
}

impl ApplicationDescription {
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Render back into the raw input shape with every default made explicit
    pub fn to_raw(&self) -> RawApplication {
        RawApplication {
            name: Some(self.name.clone()),
            version: Some(self.version.clone()),
            description: self.description.clone(),
            access: Some(self.access.to_string()),
            auth: self.auth.as_ref().map(AuthConfig::to_raw),
            required_claims: self.required_claims.as_map().clone(),
            allowed_subjects: self.allowed_subjects.clone(),
            variables: self
                .variables
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            components: self.components.iter().map(Component::to_raw).collect(),
            extra: BTreeMap::new(),
        }
    }
}

impl Component {
    pub fn to_raw(&self) -> RawComponent {
        RawComponent {
            id: Some(self.id.clone()),
            source: Some(self.source.to_raw()),
            build: self.build.as_ref().map(|b| RawBuild {
                command: Some(b.command.clone()),
                workdir: b.workdir.clone(),
                watch: b.watch.clone(),
            }),
            variables: self
                .variables
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            extra: BTreeMap::new(),
        }
    }
}

impl ComponentSource {
    pub fn is_local(&self) -> bool {
        matches!(self, ComponentSource::Local { .. })
    }

    pub fn registry(&self) -> Option<&str> {
        match self {
            ComponentSource::Registry { registry, .. } => Some(registry),
            ComponentSource::Local { .. } => None,
        }
    }

    pub fn to_raw(&self) -> RawSource {
        match self {
            ComponentSource::Local { path } => RawSource::Reference(path.clone()),
            ComponentSource::Registry {
                registry,
                package,
                version,
            } => RawSource::Registry {
                registry: Some(registry.clone()),
                package: Some(package.clone()),
                version: Some(version.clone()),
            },
        }
    }
}

impl AuthConfig {
    pub fn to_raw(&self) -> RawAuth {
        RawAuth {
            jwt_issuer: self.jwt_issuer.clone(),
            jwt_audience: self.jwt_audience.clone(),
            jwt_jwks_uri: self.jwt_jwks_uri.clone(),
            jwt_required_scopes: self.jwt_required_scopes.clone(),
            policy: self.policy.clone(),
            policy_data: self.policy_data.clone(),
        }
    }
}

impl std::fmt::Display for ComponentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentSource::Local { path } => write!(f, "{}", path),
            ComponentSource::Registry {
                registry,
                package,
                version,
            } => write!(f, "{}/{}@{}", registry, package, version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_are_collected() {
        let raw: Result<RawComponent, _> = serde_json::from_value(json!({
            "id": "echo",
            "source": "echo.wasm",
            "key_value_stores": ["default"],
            "allowed_outbound_hosts": ["https://*"]
        }));
        assert!(raw.is_ok_and(|c| c.extra.contains_key("key_value_stores")
            && c.extra.contains_key("allowed_outbound_hosts")
            && c.id.as_deref() == Some("echo")));
    }

    #[test]
    fn test_camel_case_aliases() {
        let raw: Result<RawApplication, _> = serde_json::from_value(json!({
            "name": "demo",
            "requiredClaims": {"role": "admin"},
            "allowedSubjects": ["user_1"]
        }));
        assert!(raw.is_ok_and(|a| a.required_claims.contains_key("role")
            && a.allowed_subjects == vec!["user_1"]
            && a.extra.is_empty()));
    }

    #[test]
    fn test_structured_source() {
        let raw: Result<RawSource, _> = serde_json::from_value(json!({
            "registry": "ghcr.io",
            "package": "acme:echo",
            "version": "1.0.0"
        }));
        assert!(raw.is_ok_and(|s| matches!(
            s,
            RawSource::Registry { registry: Some(r), .. } if r == "ghcr.io"
        )));
    }

    #[test]
    fn test_registry_display() {
        let source = ComponentSource::Registry {
            registry: "ghcr.io".to_string(),
            package: "acme:echo".to_string(),
            version: "1.0.0".to_string(),
        };
        assert_eq!(source.to_string(), "ghcr.io/acme:echo@1.0.0");
        assert_eq!(source.registry(), Some("ghcr.io"));
    }
}
