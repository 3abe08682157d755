use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("owner subject required for private mode")]
    MissingOwnerSubject,

    #[error("organization ID required for org mode")]
    MissingOrgId,

    #[error("unknown authorization mode: {0}")]
    UnknownMode(String),

    #[error("Failed to serialize policy data: {0}")]
    Serialize(#[from] serde_json::Error),
}
