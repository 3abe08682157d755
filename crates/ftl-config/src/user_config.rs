use crate::synthesis::SynthesisConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys accepted by `ftl config set`
pub const KNOWN_KEYS: &[&str] = &[
    "gateway-registry",
    "gateway-version",
    "authorizer-registry",
    "authorizer-version",
    "default-registry",
    "platform-issuer",
    "platform-audience",
    "platform-jwks-uri",
    "verbosity",
];

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    UnknownKey(String),
    NoHomeDir,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
            ConfigError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {}. Supported keys: {}",
                key,
                KNOWN_KEYS.join(", ")
            ),
            ConfigError::NoHomeDir => write!(f, "Could not determine home directory"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// User configuration stored in `ftl.toml`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_registry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_registry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_registry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_jwks_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
}

impl Config {
    /// Resolve the config file location.
    ///
    /// `FTL_CONFIG` wins when set and non-empty, otherwise
    /// `~/.config/ftl/ftl.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(env_path) = std::env::var("FTL_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".config")
            .join("ftl")
            .join("ftl.toml");

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join("ftl")
            .join("ftl.toml");

        Ok(default)
    }

    /// Load the config, returning an empty one when the file does not exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "gateway-registry" => self.gateway_registry.clone(),
            "gateway-version" => self.gateway_version.clone(),
            "authorizer-registry" => self.authorizer_registry.clone(),
            "authorizer-version" => self.authorizer_version.clone(),
            "default-registry" => self.default_registry.clone(),
            "platform-issuer" => self.platform_issuer.clone(),
            "platform-audience" => self.platform_audience.clone(),
            "platform-jwks-uri" => self.platform_jwks_uri.clone(),
            "verbosity" => self.verbosity.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        let slot = match key {
            "gateway-registry" => &mut self.gateway_registry,
            "gateway-version" => &mut self.gateway_version,
            "authorizer-registry" => &mut self.authorizer_registry,
            "authorizer-version" => &mut self.authorizer_version,
            "default-registry" => &mut self.default_registry,
            "platform-issuer" => &mut self.platform_issuer,
            "platform-audience" => &mut self.platform_audience,
            "platform-jwks-uri" => &mut self.platform_jwks_uri,
            "verbosity" => &mut self.verbosity,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        *slot = Some(value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values_iter().is_empty()
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KNOWN_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// Platform constants with this config's overrides applied
    pub fn synthesis_config(&self) -> SynthesisConfig {
        let mut config = SynthesisConfig::default();
        if let Some(ref v) = self.gateway_registry {
            config.gateway.registry.clone_from(v);
        }
        if let Some(ref v) = self.gateway_version {
            config.gateway.version.clone_from(v);
        }
        if let Some(ref v) = self.authorizer_registry {
            config.authorizer.registry.clone_from(v);
        }
        if let Some(ref v) = self.authorizer_version {
            config.authorizer.version.clone_from(v);
        }
        if let Some(ref v) = self.default_registry {
            config.default_registry.clone_from(v);
        }
        if let Some(ref v) = self.platform_issuer {
            config.identity_provider.issuer.clone_from(v);
        }
        if let Some(ref v) = self.platform_audience {
            config.identity_provider.audience.clone_from(v);
        }
        if let Some(ref v) = self.platform_jwks_uri {
            config.identity_provider.jwks_uri.clone_from(v);
        }
        config
    }
}
