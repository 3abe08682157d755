pub mod config;
pub mod init;
pub mod policy;
pub mod synth;
pub mod validate;
