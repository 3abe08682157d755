//! Deployment-side entry point
//!
//! Wraps parse, compose, validate and synthesize with the checks a hosted
//! platform applies before accepting a description: registry-only sources
//! and a registry allow-list. Optionally generates the access policy that
//! is uploaded alongside the manifest.

use ftl_config::SynthesisConfig;
use ftl_manifest::Manifest;
use ftl_policy::{AccessMode, Policy, PolicyContext, PolicyGenerator};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::compose;
use crate::errors::{SynthError, ValidationError, ValidationErrors};
use crate::formats::{self, Format};
use crate::schema::ApplicationDescription;
use crate::synthesizer::{DeploymentContext, Synthesizer};
use crate::validator;

#[derive(Debug, Clone, Default)]
pub struct PlatformConfig {
    pub synthesis: SynthesisConfig,
    /// Reject components built from local paths
    pub require_registry_components: bool,
    /// Registry hosts components may come from; empty allows any
    pub allowed_registries: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    pub config_data: String,
    /// Detected from the content when absent
    pub format: Option<Format>,
    pub variables: BTreeMap<String, String>,
    /// Injected for `org` access, replacing any list in the description
    pub allowed_subjects: Vec<String>,
    pub deployment_context: Option<DeploymentContext>,
    /// Generate a policy document when present
    pub policy_context: Option<PolicyContext>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMetadata {
    pub app_name: String,
    pub app_version: String,
    pub component_count: usize,
    pub access_mode: AccessMode,
    pub injected_gateway: bool,
    pub injected_authorizer: bool,
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub manifest: Manifest,
    pub manifest_toml: String,
    pub policy: Option<Policy>,
    pub metadata: ProcessMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct Processor {
    config: PlatformConfig,
    generator: PolicyGenerator,
}

impl Processor {
    pub fn new(config: PlatformConfig) -> Self {
        Processor {
            config,
            generator: PolicyGenerator::new(),
        }
    }

    pub fn process(&self, request: &ProcessRequest) -> Result<ProcessResult, SynthError> {
        let format = request
            .format
            .unwrap_or_else(|| Format::detect(&request.config_data));
        debug!("Processing {} description", format);

        let base = formats::parse(&request.config_data, format)?;
        let mut raw = compose::merge(base, &[], &request.variables);
        let is_org = raw.access.as_deref().map(str::trim) == Some(AccessMode::Org.as_str());
        if is_org && !request.allowed_subjects.is_empty() {
            raw.allowed_subjects.clone_from(&request.allowed_subjects);
        }

        let app = validator::validate(&raw, &self.config.synthesis)?;
        self.check_platform_rules(&app)?;

        let synthesizer = Synthesizer::new(self.config.synthesis.clone());
        let manifest =
            synthesizer.synthesize_with_context(&app, request.deployment_context.as_ref())?;
        let manifest_toml = manifest.to_toml_string().map_err(crate::errors::SynthesisError::from)?;

        let policy = match &request.policy_context {
            Some(ctx) => self.generator.generate(app.access, &policy_context_for(&app, ctx))?,
            None => None,
        };

        let metadata = ProcessMetadata {
            app_name: app.name.clone(),
            app_version: app.version.clone(),
            component_count: app.components.len(),
            access_mode: app.access,
            injected_gateway: manifest
                .component(&self.config.synthesis.gateway.id)
                .is_some(),
            injected_authorizer: manifest
                .component(&self.config.synthesis.authorizer.id)
                .is_some(),
        };
        info!(
            "Processed '{}' v{} ({} components, {} access)",
            metadata.app_name, metadata.app_version, metadata.component_count, metadata.access_mode
        );

        Ok(ProcessResult {
            manifest,
            manifest_toml,
            policy,
            metadata,
        })
    }

    fn check_platform_rules(&self, app: &ApplicationDescription) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        for (index, component) in app.components.iter().enumerate() {
            let field = format!("components[{}].source", index);
            match component.source.registry() {
                None if self.config.require_registry_components => {
                    errors.push(ValidationError::LocalSourceForbidden { field });
                }
                Some(registry)
                    if !self.config.allowed_registries.is_empty()
                        && !self.config.allowed_registries.iter().any(|r| r == registry) =>
                {
                    errors.push(ValidationError::ForbiddenRegistry {
                        field,
                        value: registry.to_string(),
                    });
                }
                _ => {}
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

/// Fill gaps in the caller's context from the description itself
fn policy_context_for(app: &ApplicationDescription, ctx: &PolicyContext) -> PolicyContext {
    let mut merged = ctx.clone();
    if merged.org_members.is_empty() {
        merged.org_members.clone_from(&app.allowed_subjects);
    }
    let mut claims = app.required_claims.clone();
    claims.extend(&ctx.required_claims);
    merged.required_claims = claims;
    merged
}
