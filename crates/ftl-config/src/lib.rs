//! Configuration for ftl manifest synthesis
//!
//! Two layers live here:
//! - [`SynthesisConfig`]: the platform constants injected into every
//!   synthesized manifest (pinned gateway/authorizer coordinates, platform
//!   identity provider, default registry).
//! - [`Config`]: the user's `ftl.toml`, whose keys override those constants.

pub mod synthesis;
pub mod user_config;

pub use synthesis::{IdentityProvider, PlatformComponent, SynthesisConfig};
pub use user_config::{Config, ConfigError, KNOWN_KEYS};
