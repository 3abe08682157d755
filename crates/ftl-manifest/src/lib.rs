//! FTL runtime manifest
//!
//! Typed model of the WebAssembly runtime manifest (Spin manifest v2) that
//! synthesis produces: application metadata, component blocks and the ordered
//! HTTP trigger list. The tree serializes to TOML with `toml`.

pub mod errors;
pub mod manifest_writer;
pub mod types;

pub use errors::ManifestError;
pub use manifest_writer::{read_from_path, write_to_path};
pub use types::{
    Application, Build, Component, HttpTrigger, Manifest, Route, Source, Triggers, Variable,
    MANIFEST_VERSION,
};
