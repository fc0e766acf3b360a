//! Application-level authorization roles.
//!
//! Roles are stored alongside the identity in the `users` collection, never in
//! the auth service itself.

use serde::{Deserialize, Serialize};

/// Error returned when a stored role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Authorization role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A buyer. Assigned when registering without choosing a role.
    #[default]
    User,
    /// A seller with access to the seller console.
    Seller,
}

impl Role {
    /// The string stored in the `role` field of a user document.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Seller => "seller",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "seller" => Ok(Self::Seller),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}
