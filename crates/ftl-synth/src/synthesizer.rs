//! Validated description → runtime manifest
//!
//! The manifest always carries the MCP gateway as the single public entry
//! point (directly in `public` mode, behind the authorizer otherwise). User
//! components only ever get private routes and never receive capability
//! grants: their blocks are built from the allow-listed fields alone.

use ftl_config::{PlatformComponent, SynthesisConfig};
use ftl_manifest::{
    Application, Build, Component as ManifestComponent, HttpTrigger, Manifest, Route, Source,
    Variable,
};
use ftl_policy::AccessMode;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::errors::SynthesisError;
use crate::schema::{ApplicationDescription, Component, ComponentSource};

pub const GATEWAY_COMPONENT_NAMES: &str = "component_names";

pub const AUTH_GATEWAY_URL: &str = "mcp_gateway_url";
pub const AUTH_JWT_ISSUER: &str = "mcp_jwt_issuer";
pub const AUTH_JWT_AUDIENCE: &str = "mcp_jwt_audience";
pub const AUTH_JWT_JWKS_URI: &str = "mcp_jwt_jwks_uri";
pub const AUTH_JWT_REQUIRED_SCOPES: &str = "mcp_jwt_required_scopes";
pub const AUTH_ALLOWED_SUBJECTS: &str = "mcp_auth_allowed_subjects";
pub const AUTH_REQUIRED_CLAIMS: &str = "mcp_auth_required_claims";
pub const AUTH_FORWARD_CLAIMS: &str = "mcp_auth_forward_claims";
pub const AUTH_POLICY: &str = "mcp_policy";
pub const AUTH_POLICY_DATA: &str = "mcp_policy_data";

/// Facts about the deploying actor supplied by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentContext {
    /// `user` or `machine`
    pub actor_type: Option<String>,
    pub org_id: Option<String>,
    /// Token claims the authorizer forwards to the gateway as headers
    pub forward_claims: BTreeMap<String, String>,
}

impl DeploymentContext {
    pub fn is_machine(&self) -> bool {
        self.actor_type.as_deref() == Some("machine")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Synthesizer { config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn synthesize(&self, app: &ApplicationDescription) -> Result<Manifest, SynthesisError> {
        self.synthesize_with_context(app, None)
    }

    pub fn synthesize_with_context(
        &self,
        app: &ApplicationDescription,
        ctx: Option<&DeploymentContext>,
    ) -> Result<Manifest, SynthesisError> {
        debug!(
            "Synthesizing manifest for '{}' ({} access, {} components)",
            app.name,
            app.access,
            app.components.len()
        );

        let mut manifest = Manifest::new(Application {
            name: app.name.clone(),
            version: app.version.clone(),
            description: app.description.clone(),
        });

        for (name, value) in &app.variables {
            manifest
                .variables
                .insert(name.clone(), Variable::with_default(value.clone()));
        }

        for component in &app.components {
            manifest
                .components
                .insert(component.id.clone(), user_component(component));
        }

        let mut gateway = platform_component(&self.config.gateway);
        if !app.components.is_empty() {
            gateway
                .variables
                .insert(GATEWAY_COMPONENT_NAMES.to_string(), component_names(app));
        }
        manifest
            .components
            .insert(self.config.gateway.id.clone(), gateway);

        if app.access.requires_authorizer() {
            let mut authorizer = platform_component(&self.config.authorizer);
            authorizer.variables = self.authorizer_variables(app, ctx)?;
            manifest
                .components
                .insert(self.config.authorizer.id.clone(), authorizer);
        }

        manifest.trigger.http = self.triggers(app);
        manifest.check()?;

        info!(
            "Synthesized manifest for '{}' with {} components",
            app.name,
            manifest.components.len()
        );
        Ok(manifest)
    }

    /// Synthesize and render to TOML text
    pub fn render(&self, app: &ApplicationDescription) -> Result<String, SynthesisError> {
        self.render_with_context(app, None)
    }

    pub fn render_with_context(
        &self,
        app: &ApplicationDescription,
        ctx: Option<&DeploymentContext>,
    ) -> Result<String, SynthesisError> {
        Ok(self.synthesize_with_context(app, ctx)?.to_toml_string()?)
    }

    fn triggers(&self, app: &ApplicationDescription) -> Vec<HttpTrigger> {
        let public = Route::Path(self.config.public_route.clone());
        let mut triggers = Vec::with_capacity(app.components.len() + 2);

        if app.access.requires_authorizer() {
            triggers.push(HttpTrigger {
                component: self.config.authorizer.id.clone(),
                route: public,
            });
            triggers.push(HttpTrigger {
                component: self.config.gateway.id.clone(),
                route: Route::Private,
            });
        } else {
            triggers.push(HttpTrigger {
                component: self.config.gateway.id.clone(),
                route: public,
            });
        }

        triggers.extend(app.components.iter().map(|c| HttpTrigger {
            component: c.id.clone(),
            route: Route::Private,
        }));
        triggers
    }

    fn authorizer_variables(
        &self,
        app: &ApplicationDescription,
        ctx: Option<&DeploymentContext>,
    ) -> Result<BTreeMap<String, String>, SynthesisError> {
        let mut vars = BTreeMap::new();
        vars.insert(
            AUTH_GATEWAY_URL.to_string(),
            self.config.gateway_internal_url(),
        );

        match app.access {
            AccessMode::Private | AccessMode::Org => {
                let idp = &self.config.identity_provider;
                vars.insert(AUTH_JWT_ISSUER.to_string(), idp.issuer.clone());
                vars.insert(AUTH_JWT_AUDIENCE.to_string(), idp.audience.clone());
                vars.insert(AUTH_JWT_JWKS_URI.to_string(), idp.jwks_uri.clone());
            }
            AccessMode::Custom => {
                let auth = app.auth.clone().unwrap_or_default();
                let issuer = auth
                    .jwt_issuer
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(SynthesisError::MissingCustomAuth {
                        field: "auth.jwt_issuer",
                    })?;
                let audience = auth
                    .jwt_audience
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(SynthesisError::MissingCustomAuth {
                        field: "auth.jwt_audience",
                    })?;
                vars.insert(AUTH_JWT_ISSUER.to_string(), issuer);
                vars.insert(AUTH_JWT_AUDIENCE.to_string(), audience);
                if let Some(jwks) = auth.jwt_jwks_uri {
                    vars.insert(AUTH_JWT_JWKS_URI.to_string(), jwks);
                }
                if !auth.jwt_required_scopes.is_empty() {
                    vars.insert(
                        AUTH_JWT_REQUIRED_SCOPES.to_string(),
                        auth.jwt_required_scopes.join(","),
                    );
                }
                if let Some(policy) = auth.policy {
                    vars.insert(AUTH_POLICY.to_string(), policy);
                }
                if let Some(data) = auth.policy_data {
                    vars.insert(AUTH_POLICY_DATA.to_string(), encode(&data, AUTH_POLICY_DATA)?);
                }
            }
            AccessMode::Public => {}
        }

        if app.access == AccessMode::Org && !app.allowed_subjects.is_empty() {
            vars.insert(
                AUTH_ALLOWED_SUBJECTS.to_string(),
                app.allowed_subjects.join(","),
            );
        }

        let mut claims = app.required_claims.clone();
        if let Some(ctx) = ctx {
            if ctx.is_machine() {
                if let Some(org_id) = &ctx.org_id {
                    claims.insert("org_id", Value::String(org_id.clone()));
                }
            }
            if !ctx.forward_claims.is_empty() {
                let forward: serde_json::Map<String, Value> = ctx
                    .forward_claims
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                vars.insert(
                    AUTH_FORWARD_CLAIMS.to_string(),
                    encode(&Value::Object(forward), AUTH_FORWARD_CLAIMS)?,
                );
            }
        }
        if !claims.is_empty() {
            vars.insert(
                AUTH_REQUIRED_CLAIMS.to_string(),
                encode(&claims.to_value(), AUTH_REQUIRED_CLAIMS)?,
            );
        }

        Ok(vars)
    }
}

fn encode(value: &Value, field: &'static str) -> Result<String, SynthesisError> {
    serde_json::to_string(value).map_err(|source| SynthesisError::Encode { field, source })
}

/// Sorted, comma-joined user component ids
fn component_names(app: &ApplicationDescription) -> String {
    let mut ids: Vec<&str> = app.components.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    ids.join(",")
}

fn platform_component(platform: &PlatformComponent) -> ManifestComponent {
    let mut component = ManifestComponent::from_source(Source::Registry {
        registry: platform.registry.clone(),
        package: platform.package.clone(),
        version: platform.version.clone(),
    });
    component.allowed_outbound_hosts = platform.allowed_outbound_hosts.iter().cloned().collect();
    component.key_value_stores = platform.key_value_stores.iter().cloned().collect();
    component
}

fn user_component(component: &Component) -> ManifestComponent {
    let source = match &component.source {
        ComponentSource::Local { path } => Source::Local(path.clone()),
        ComponentSource::Registry {
            registry,
            package,
            version,
        } => Source::Registry {
            registry: registry.clone(),
            package: package.clone(),
            version: version.clone(),
        },
    };

    let mut block = ManifestComponent::from_source(source);
    block.build = component
        .build
        .as_ref()
        .filter(|b| component.source.is_local() && !b.command.trim().is_empty())
        .map(|b| Build {
            command: b.command.clone(),
            workdir: b.workdir.clone(),
            watch: b.watch.iter().cloned().collect(),
        });
    block.variables.clone_from(&component.variables);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AuthConfig, BuildConfig};
    use ftl_policy::ClaimRequirements;

    fn app(access: AccessMode, components: &[&str]) -> ApplicationDescription {
        ApplicationDescription {
            name: "demo".to_string(),
            version: "0.1.0".to_string(),
            description: None,
            access,
            auth: None,
            required_claims: ClaimRequirements::default(),
            allowed_subjects: Vec::new(),
            variables: BTreeMap::new(),
            components: components
                .iter()
                .map(|id| Component {
                    id: (*id).to_string(),
                    source: ComponentSource::Local {
                        path: format!("{}.wasm", id),
                    },
                    build: None,
                    variables: BTreeMap::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_component_names_sorted() {
        let manifest =
            Synthesizer::default().synthesize(&app(AccessMode::Public, &["zeta", "alpha"]));
        assert!(manifest.is_ok_and(|m| m
            .component("ftl-mcp-gateway")
            .and_then(|g| g.variables.get(GATEWAY_COMPONENT_NAMES))
            .is_some_and(|names| names == "alpha,zeta")));
    }

    #[test]
    fn test_trigger_order() {
        let result = Synthesizer::default().synthesize(&app(AccessMode::Private, &["b", "a"]));
        let Ok(manifest) = result else {
            assert!(false, "synthesis failed");
            return;
        };
        let order: Vec<&str> = manifest
            .trigger
            .http
            .iter()
            .map(|t| t.component.as_str())
            .collect();
        assert_eq!(order, vec!["mcp-authorizer", "ftl-mcp-gateway", "b", "a"]);
    }

    #[test]
    fn test_build_is_copied() {
        let mut description = app(AccessMode::Public, &["echo"]);
        description.components[0].build = Some(BuildConfig {
            command: "cargo build --release".to_string(),
            workdir: Some("echo".to_string()),
            watch: vec!["src/**/*.rs".to_string()],
        });
        let manifest = Synthesizer::default().synthesize(&description);
        assert!(manifest.is_ok_and(|m| m
            .component("echo")
            .and_then(|c| c.build.as_ref())
            .is_some_and(|b| b.workdir.as_deref() == Some("echo") && b.watch.len() == 1)));
    }

    #[test]
    fn test_build_dropped_for_registry_source() {
        let mut description = app(AccessMode::Public, &["echo"]);
        description.components[0].source = ComponentSource::Registry {
            registry: "ghcr.io".to_string(),
            package: "acme:echo".to_string(),
            version: "1.0.0".to_string(),
        };
        description.components[0].build = Some(BuildConfig {
            command: "make".to_string(),
            workdir: None,
            watch: Vec::new(),
        });
        let manifest = Synthesizer::default().synthesize(&description);
        assert!(manifest.is_ok_and(|m| m.component("echo").is_some_and(|c| c.build.is_none())));
    }

    #[test]
    fn test_gateway_without_components_has_no_names() {
        let manifest = Synthesizer::default().synthesize(&app(AccessMode::Public, &[]));
        assert!(manifest.is_ok_and(|m| m
            .component("ftl-mcp-gateway")
            .is_some_and(|g| !g.variables.contains_key(GATEWAY_COMPONENT_NAMES))));
    }

    #[test]
    fn test_custom_without_auth_is_rejected() {
        let result = Synthesizer::default().synthesize(&app(AccessMode::Custom, &[]));
        assert!(matches!(
            result,
            Err(SynthesisError::MissingCustomAuth {
                field: "auth.jwt_issuer"
            })
        ));
    }

    #[test]
    fn test_custom_with_blank_auth_is_rejected() {
        let mut custom = app(AccessMode::Custom, &["echo"]);
        custom.auth = Some(AuthConfig {
            jwt_issuer: Some(String::new()),
            jwt_audience: Some("  ".to_string()),
            ..AuthConfig::default()
        });
        assert!(matches!(
            Synthesizer::default().synthesize(&custom),
            Err(SynthesisError::MissingCustomAuth {
                field: "auth.jwt_issuer"
            })
        ));

        custom.auth = Some(AuthConfig {
            jwt_issuer: Some("https://id.example.com".to_string()),
            jwt_audience: Some("  ".to_string()),
            ..AuthConfig::default()
        });
        assert!(matches!(
            Synthesizer::default().synthesize(&custom),
            Err(SynthesisError::MissingCustomAuth {
                field: "auth.jwt_audience"
            })
        ));
    }

    #[test]
    fn test_machine_context_adds_org_claim() {
        let ctx = DeploymentContext {
            actor_type: Some("machine".to_string()),
            org_id: Some("org_42".to_string()),
            forward_claims: BTreeMap::from([("sub".to_string(), "X-User-Id".to_string())]),
        };
        let result = Synthesizer::default()
            .synthesize_with_context(&app(AccessMode::Org, &["echo"]), Some(&ctx));
        let Ok(manifest) = result else {
            assert!(false, "synthesis failed");
            return;
        };
        let vars = manifest
            .component("mcp-authorizer")
            .map(|c| c.variables.clone())
            .unwrap_or_default();
        assert_eq!(
            vars.get(AUTH_REQUIRED_CLAIMS).map(String::as_str),
            Some(r#"{"org_id":"org_42"}"#)
        );
        assert_eq!(
            vars.get(AUTH_FORWARD_CLAIMS).map(String::as_str),
            Some(r#"{"sub":"X-User-Id"}"#)
        );
    }

    #[test]
    fn test_user_context_adds_nothing() {
        let ctx = DeploymentContext {
            actor_type: Some("user".to_string()),
            org_id: Some("org_42".to_string()),
            forward_claims: BTreeMap::new(),
        };
        let result = Synthesizer::default()
            .synthesize_with_context(&app(AccessMode::Private, &[]), Some(&ctx));
        assert!(result.is_ok_and(|m| m
            .component("mcp-authorizer")
            .is_some_and(|c| !c.variables.contains_key(AUTH_REQUIRED_CLAIMS))));
    }
}
