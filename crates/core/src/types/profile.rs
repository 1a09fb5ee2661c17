//! Account profile stored alongside the auth record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;

/// Profile document kept at `users/{uid}`.
///
/// The email is copied from the auth account at registration and is never
/// edited afterwards; only the display name changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a fresh profile.
    #[must_use]
    pub fn new(email: Email, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            email,
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rename, bumping `updated_at`.
    pub fn rename(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        self.name = name.into();
        self.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_rename_keeps_email_and_created_at() {
        let now = Utc::now();
        let mut profile = UserProfile::new(Email::parse("a@b.c").unwrap(), "Ada", now);
        let later = now + Duration::minutes(5);
        profile.rename("Ada L.", later);

        assert_eq!(profile.name, "Ada L.");
        assert_eq!(profile.email.as_str(), "a@b.c");
        assert_eq!(profile.created_at, now);
        assert_eq!(profile.updated_at, later);
    }

    #[test]
    fn test_document_keys_are_camel_case() {
        let profile = UserProfile::new(Email::parse("a@b.c").unwrap(), "Ada", Utc::now());
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
