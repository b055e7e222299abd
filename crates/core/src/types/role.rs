//! User role classification.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the [`Role`] values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct InvalidRole(pub String);

/// Account role. New accounts are plain users until upgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Premium,
}

impl Role {
    /// Every accepted wire value, in declaration order.
    pub const ALLOWED: &'static [&'static str] = &["user", "premium"];

    /// The wire value of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "premium" => Ok(Self::Premium),
            _ => Err(InvalidRole(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_user() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!("premium".parse::<Role>().unwrap(), Role::Premium);
        assert!("Premium".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_allowed_matches_variants() {
        for value in Role::ALLOWED {
            let role: Role = value.parse().unwrap();
            assert_eq!(role.as_str(), *value);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Premium).unwrap(), "\"premium\"");
    }
}
