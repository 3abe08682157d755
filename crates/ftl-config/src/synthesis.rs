use serde::{Deserialize, Serialize};

pub const GATEWAY_ID: &str = "ftl-mcp-gateway";
pub const GATEWAY_PACKAGE: &str = "fastertools:mcp-gateway";
pub const GATEWAY_VERSION: &str = "0.0.13-alpha.0";

pub const AUTHORIZER_ID: &str = "mcp-authorizer";
pub const AUTHORIZER_PACKAGE: &str = "fastertools:mcp-authorizer";
pub const AUTHORIZER_VERSION: &str = "0.0.15-alpha.0";

pub const DEFAULT_REGISTRY: &str = "ghcr.io";

pub const PLATFORM_ISSUER: &str = "https://divine-lion-50-staging.authkit.app";
pub const PLATFORM_AUDIENCE: &str = "ftl-platform";
pub const PLATFORM_JWKS_URI: &str = "https://divine-lion-50-staging.authkit.app/oauth2/jwks";

pub const PUBLIC_ROUTE: &str = "/...";

/// A platform component injected into every manifest
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlatformComponent {
    pub id: String,
    pub registry: String,
    pub package: String,
    pub version: String,
    #[serde(default)]
    pub allowed_outbound_hosts: Vec<String>,
    #[serde(default)]
    pub key_value_stores: Vec<String>,
}

/// Issuer/audience/JWKS triple of the platform identity provider
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentityProvider {
    pub issuer: String,
    pub audience: String,
    pub jwks_uri: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SynthesisConfig {
    pub gateway: PlatformComponent,
    pub authorizer: PlatformComponent,
    pub identity_provider: IdentityProvider,
    /// Registry host assumed for `namespace/name:version` references
    pub default_registry: String,
    /// Route pattern bound to the public entry point
    pub public_route: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        SynthesisConfig {
            gateway: PlatformComponent {
                id: GATEWAY_ID.to_string(),
                registry: DEFAULT_REGISTRY.to_string(),
                package: GATEWAY_PACKAGE.to_string(),
                version: GATEWAY_VERSION.to_string(),
                allowed_outbound_hosts: vec!["http://*.spin.internal".to_string()],
                key_value_stores: Vec::new(),
            },
            authorizer: PlatformComponent {
                id: AUTHORIZER_ID.to_string(),
                registry: DEFAULT_REGISTRY.to_string(),
                package: AUTHORIZER_PACKAGE.to_string(),
                version: AUTHORIZER_VERSION.to_string(),
                allowed_outbound_hosts: vec![
                    "http://*.spin.internal".to_string(),
                    "https://*.authkit.app".to_string(),
                    "https://*.workos.com".to_string(),
                ],
                key_value_stores: vec!["default".to_string()],
            },
            identity_provider: IdentityProvider {
                issuer: PLATFORM_ISSUER.to_string(),
                audience: PLATFORM_AUDIENCE.to_string(),
                jwks_uri: PLATFORM_JWKS_URI.to_string(),
            },
            default_registry: DEFAULT_REGISTRY.to_string(),
            public_route: PUBLIC_ROUTE.to_string(),
        }
    }
}

impl SynthesisConfig {
    /// Internal service-mesh URL the authorizer forwards to
    pub fn gateway_internal_url(&self) -> String {
        format!("http://{}.spin.internal", self.gateway.id)
    }

    /// Ids reserved for platform components
    pub fn reserved_ids(&self) -> [&str; 2] {
        [self.gateway.id.as_str(), self.authorizer.id.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gateway_url() {
        let config = SynthesisConfig::default();
        assert_eq!(
            config.gateway_internal_url(),
            "http://ftl-mcp-gateway.spin.internal"
        );
    }

    #[test]
    fn test_authorizer_has_default_store() {
        let config = SynthesisConfig::default();
        assert_eq!(config.authorizer.key_value_stores, vec!["default"]);
        assert!(config.gateway.key_value_stores.is_empty());
    }

    #[test]
    fn test_reserved_ids() {
        let config = SynthesisConfig::default();
        assert_eq!(config.reserved_ids(), ["ftl-mcp-gateway", "mcp-authorizer"]);
    }
}
