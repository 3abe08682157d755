//! FTL manifest synthesis
//!
//! Turns an application description (YAML, JSON, CUE or the Rust builder)
//! into a WebAssembly runtime manifest with the MCP gateway and, unless the
//! application is public, the token-validating authorizer injected in front
//! of the user's components.
//!
//! Pipeline: [`formats::parse`] → [`compose::merge`] → [`validator::validate`]
//! → [`Synthesizer::synthesize`] → [`ftl_manifest::Manifest::to_toml_string`].
//! None of these steps touch the filesystem or network.

pub mod builder;
pub mod compose;
pub mod errors;
pub mod formats;
pub mod platform;
pub mod schema;
pub mod source;
pub mod synthesizer;
pub mod validator;

pub use errors::{ParseError, SynthError, SynthesisError, ValidationError, ValidationErrors};
pub use formats::Format;
pub use schema::{ApplicationDescription, ComponentSource, RawApplication};
pub use synthesizer::{DeploymentContext, Synthesizer};

use ftl_config::SynthesisConfig;

/// Parse and validate a description
pub fn load_description(
    content: &str,
    format: Format,
    config: &SynthesisConfig,
) -> Result<ApplicationDescription, SynthError> {
    let raw = formats::parse(content, format)?;
    Ok(validator::validate(&raw, config)?)
}

/// Parse, validate, synthesize and render in one call
pub fn synthesize_str(
    content: &str,
    format: Format,
    config: &SynthesisConfig,
) -> Result<String, SynthError> {
    let app = load_description(content, format, config)?;
    Ok(Synthesizer::new(config.clone()).render(&app)?)
}
