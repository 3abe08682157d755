use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PolicyError;

/// Who may reach an application's tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Public,
    Private,
    Org,
    Custom,
}

impl AccessMode {
    pub const ALL: [AccessMode; 4] = [
        AccessMode::Public,
        AccessMode::Private,
        AccessMode::Org,
        AccessMode::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Public => "public",
            AccessMode::Private => "private",
            AccessMode::Org => "org",
            AccessMode::Custom => "custom",
        }
    }

    /// Whether requests must pass through the token-validating authorizer
    pub fn requires_authorizer(self) -> bool {
        !matches!(self, AccessMode::Public)
    }

    /// Whether the platform identity provider issues the tokens
    pub fn uses_platform_identity(self) -> bool {
        matches!(self, AccessMode::Private | AccessMode::Org)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_modes() {
        assert!("org".parse::<AccessMode>().is_ok_and(|m| m == AccessMode::Org));
        assert!("custom"
            .parse::<AccessMode>()
            .is_ok_and(|m| m == AccessMode::Custom));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!(
            "Private".parse::<AccessMode>(),
            Err(PolicyError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_authorizer_requirement() {
        assert!(!AccessMode::Public.requires_authorizer());
        assert!(AccessMode::Custom.requires_authorizer());
        assert!(!AccessMode::Custom.uses_platform_identity());
        assert!(AccessMode::Org.uses_platform_identity());
    }
}
