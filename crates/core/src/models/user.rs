//! User documents stored in the `users` collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Role;

/// The per-user document written at registration, keyed by uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Raw role string. Kept untyped so an unexpected value does not make the
    /// whole document unreadable.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// The parsed role, if the stored value is a known one.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|raw| raw.parse().ok())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_lenient() {
        let seller: UserRecord =
            serde_json::from_value(serde_json::json!({ "role": "seller" })).unwrap();
        assert_eq!(seller.role(), Some(Role::Seller));

        let unknown: UserRecord =
            serde_json::from_value(serde_json::json!({ "role": "moderator" })).unwrap();
        assert_eq!(unknown.role(), None);

        let missing: UserRecord = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(missing.role(), None);
    }
}
