//! Runtime manifest tree
//!
//! Maps and small lists are chosen so that rendering is deterministic:
//! component blocks and variables are keyed by `BTreeMap`, and the trigger
//! list keeps the order synthesis produced it in.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};

use crate::errors::ManifestError;

pub const MANIFEST_VERSION: u32 = 2;

// =============================================================================
// MANIFEST
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub spin_manifest_version: u32,
    pub application: Application,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, Variable>,
    #[serde(default, rename = "component")]
    pub components: BTreeMap<String, Component>,
    #[serde(default)]
    pub trigger: Triggers,
}

impl Manifest {
    pub fn new(application: Application) -> Self {
        Manifest {
            spin_manifest_version: MANIFEST_VERSION,
            application,
            variables: BTreeMap::new(),
            components: BTreeMap::new(),
            trigger: Triggers::default(),
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    /// Route bound to a component, if any trigger references it
    pub fn route_for(&self, component_id: &str) -> Option<&Route> {
        self.trigger
            .http
            .iter()
            .find(|t| t.component == component_id)
            .map(|t| &t.route)
    }

    /// Components reachable through a public route
    pub fn public_components(&self) -> Vec<&str> {
        self.trigger
            .http
            .iter()
            .filter(|t| t.route.is_public())
            .map(|t| t.component.as_str())
            .collect()
    }

    /// Structural checks: every trigger targets a declared component and no
    /// component is bound twice.
    pub fn check(&self) -> Result<(), ManifestError> {
        if self.spin_manifest_version != MANIFEST_VERSION {
            return Err(ManifestError::InvalidManifest(format!(
                "unsupported manifest version {}",
                self.spin_manifest_version
            )));
        }

        let mut seen = HashSet::new();
        for trigger in &self.trigger.http {
            if !self.components.contains_key(&trigger.component) {
                return Err(ManifestError::InvalidManifest(format!(
                    "trigger references unknown component '{}'",
                    trigger.component
                )));
            }
            if !seen.insert(trigger.component.as_str()) {
                return Err(ManifestError::InvalidManifest(format!(
                    "component '{}' is bound by more than one trigger",
                    trigger.component
                )));
            }
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Application-level variable declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secret: bool,
}

impl Variable {
    pub fn with_default(value: impl Into<String>) -> Self {
        Variable {
            default: Some(value.into()),
            ..Default::default()
        }
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub source: Source,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub allowed_outbound_hosts: SmallVec<[String; 4]>,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub key_value_stores: SmallVec<[String; 1]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Build>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl Component {
    pub fn from_source(source: Source) -> Self {
        Component {
            source,
            allowed_outbound_hosts: SmallVec::new(),
            key_value_stores: SmallVec::new(),
            build: None,
            variables: BTreeMap::new(),
        }
    }
}

/// Where a component's wasm comes from: a local path or a registry package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Local(String),
    Registry {
        registry: String,
        package: String,
        version: String,
    },
}

impl Source {
    pub fn is_local(&self) -> bool {
        matches!(self, Source::Local(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub watch: SmallVec<[String; 4]>,
}

// =============================================================================
// TRIGGERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub http: Vec<HttpTrigger>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTrigger {
    pub component: String,
    pub route: Route,
}

/// An HTTP route is either a public path pattern or the private marker,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RouteRepr", into = "RouteRepr")]
pub enum Route {
    Path(String),
    Private,
}

impl Route {
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Path(_))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RouteRepr {
    Path(String),
    Flag { private: bool },
}

impl From<Route> for RouteRepr {
    fn from(route: Route) -> Self {
        match route {
            Route::Path(path) => RouteRepr::Path(path),
            Route::Private => RouteRepr::Flag { private: true },
        }
    }
}

impl TryFrom<RouteRepr> for Route {
    type Error = String;

    fn try_from(repr: RouteRepr) -> Result<Self, Self::Error> {
        match repr {
            RouteRepr::Path(path) => Ok(Route::Path(path)),
            RouteRepr::Flag { private: true } => Ok(Route::Private),
            RouteRepr::Flag { private: false } => {
                Err("route must be a path or `{ private = true }`".to_string())
            }
        }
    }
}
