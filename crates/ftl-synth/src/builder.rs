//! Fluent construction of application descriptions from Rust code
//!
//! ```
//! use ftl_synth::builder::ApplicationBuilder;
//! use ftl_policy::AccessMode;
//!
//! let app = ApplicationBuilder::new("weather")
//!     .version("1.0.0")
//!     .access(AccessMode::Private)
//!     .component("forecast")
//!     .local("./forecast.wasm")
//!     .build_command("cargo build --release")
//!     .finish()
//!     .build();
//! assert!(app.is_ok());
//! ```

use ftl_config::SynthesisConfig;
use ftl_policy::AccessMode;
use serde_json::Value;

use crate::errors::ValidationErrors;
use crate::schema::{
    ApplicationDescription, RawApplication, RawAuth, RawBuild, RawComponent, RawSource,
};
use crate::validator;

#[derive(Debug, Clone, Default)]
pub struct ApplicationBuilder {
    raw: RawApplication,
}

impl ApplicationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ApplicationBuilder {
            raw: RawApplication {
                name: Some(name.into()),
                ..Default::default()
            },
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.raw.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.raw.description = Some(description.into());
        self
    }

    pub fn access(mut self, mode: AccessMode) -> Self {
        self.raw.access = Some(mode.to_string());
        self
    }

    /// Switch to `custom` access with the given token issuer and audience
    pub fn custom_auth(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.raw.access = Some(AccessMode::Custom.to_string());
        let auth = self.raw.auth.get_or_insert_with(RawAuth::default);
        auth.jwt_issuer = Some(issuer.into());
        auth.jwt_audience = Some(audience.into());
        self
    }

    pub fn jwks_uri(mut self, uri: impl Into<String>) -> Self {
        self.raw
            .auth
            .get_or_insert_with(RawAuth::default)
            .jwt_jwks_uri = Some(uri.into());
        self
    }

    pub fn required_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.raw.required_claims.insert(name.into(), value);
        self
    }

    pub fn allowed_subject(mut self, subject: impl Into<String>) -> Self {
        self.raw.allowed_subjects.push(subject.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw
            .variables
            .insert(name.into(), Value::String(value.into()));
        self
    }

    pub fn component(self, id: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            parent: self,
            raw: RawComponent {
                id: Some(id.into()),
                ..Default::default()
            },
        }
    }

    /// The raw description, before validation
    pub fn into_raw(self) -> RawApplication {
        self.raw
    }

    pub fn build(self) -> Result<ApplicationDescription, ValidationErrors> {
        self.build_with(&SynthesisConfig::default())
    }

    pub fn build_with(
        self,
        config: &SynthesisConfig,
    ) -> Result<ApplicationDescription, ValidationErrors> {
        validator::validate(&self.raw, config)
    }
}

#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    parent: ApplicationBuilder,
    raw: RawComponent,
}

impl ComponentBuilder {
    pub fn local(mut self, path: impl Into<String>) -> Self {
        self.raw.source = Some(RawSource::Reference(path.into()));
        self
    }

    /// Any reference string the source normalizer accepts
    pub fn source(self, reference: impl Into<String>) -> Self {
        self.local(reference)
    }

    pub fn registry(
        mut self,
        registry: impl Into<String>,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.raw.source = Some(RawSource::Registry {
            registry: Some(registry.into()),
            package: Some(package.into()),
            version: Some(version.into()),
        });
        self
    }

    pub fn build_command(mut self, command: impl Into<String>) -> Self {
        self.raw.build.get_or_insert_with(RawBuild::default).command = Some(command.into());
        self
    }

    pub fn workdir(mut self, workdir: impl Into<String>) -> Self {
        self.raw.build.get_or_insert_with(RawBuild::default).workdir = Some(workdir.into());
        self
    }

    pub fn watch(mut self, pattern: impl Into<String>) -> Self {
        self.raw
            .build
            .get_or_insert_with(RawBuild::default)
            .watch
            .push(pattern.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw
            .variables
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Attach the component and return to the application builder
    pub fn finish(mut self) -> ApplicationBuilder {
        self.parent.raw.components.push(self.raw);
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ComponentSource;
    use serde_json::json;

    #[test]
    fn test_builds_valid_description() {
        let app = ApplicationBuilder::new("weather")
            .description("Forecast tools")
            .custom_auth("https://id.example.com", "weather-api")
            .required_claim("roles", json!(["reader"]))
            .component("forecast")
            .registry("ghcr.io", "acme:forecast", "1.0.0")
            .variable("units", "metric")
            .finish()
            .component("alerts")
            .local("./alerts.wasm")
            .build_command("make")
            .watch("src/*.c")
            .finish()
            .build();

        let Ok(app) = app else {
            assert!(false, "builder produced an invalid description");
            return;
        };
        assert_eq!(app.access, AccessMode::Custom);
        assert_eq!(app.components.len(), 2);
        assert!(matches!(
            app.component("forecast").map(|c| &c.source),
            Some(ComponentSource::Registry { version, .. }) if version == "1.0.0"
        ));
        assert_eq!(
            app.component("alerts")
                .and_then(|c| c.build.as_ref())
                .map(|b| b.watch.clone()),
            Some(vec!["src/*.c".to_string()])
        );
    }

    #[test]
    fn test_build_reports_validation_errors() {
        let result = ApplicationBuilder::new("Bad")
            .component("echo")
            .finish()
            .build();
        assert!(result.is_err_and(|e| e.has_field("name") && e.has_field("components[0].source")));
    }
}
