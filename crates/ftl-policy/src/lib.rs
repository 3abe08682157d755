//! Authorization policy generation
//!
//! Produces a Rego policy document plus its data document for the
//! platform-managed access modes (`private`, `org`). `public` needs no
//! policy and `custom` is supplied entirely by the user.

pub mod claims;
pub mod errors;
pub mod generator;
pub mod mode;

pub use claims::ClaimRequirements;
pub use errors::PolicyError;
pub use generator::{Policy, PolicyContext, PolicyGenerator, POLICY_PACKAGE, POLICY_QUERY};
pub use mode::AccessMode;
