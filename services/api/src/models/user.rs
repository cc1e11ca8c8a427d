//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of roles understood by the authorization gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parse a role from its stored string form, defaulting unknown
    /// values to the unprivileged role
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Pure membership predicate backing the role gate
pub fn role_allowed(allowed: &[Role], role: Role) -> bool {
    allowed.contains(&role)
}

/// Reference to an uploaded avatar image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Avatar {
    pub public_id: String,
    pub url: String,
}

/// User entity
///
/// The password hash is never serialized: the same struct backs both API
/// responses and the cached session snapshot, and neither may carry it.
/// Deserializing a snapshot leaves the hash empty; any path that needs
/// the hash reads it from the canonical store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub avatar: Option<Avatar>,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account can authenticate with a password
    ///
    /// Social-auth accounts are created without one and must be checked
    /// against the canonical row, not a session snapshot (snapshots
    /// always drop the hash).
    pub fn has_usable_password(&self) -> bool {
        !self.password_hash.is_empty()
    }
}

/// Pending registration carried inside an activation ticket
///
/// Not persisted anywhere; the signature on the ticket is its only
/// existence proof.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// New user creation payload, password still in the clear
///
/// `password` is `None` for social-auth accounts, which never get a
/// usable password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub avatar: Option<Avatar>,
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            avatar: None,
            role: Role::User,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.com");
    }

    #[test]
    fn test_snapshot_round_trip_drops_hash() {
        let user = sample_user();
        let snapshot = serde_json::to_string(&user).unwrap();
        let restored: User = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(restored.id, user.id);
        assert_eq!(restored.email, user.email);
        assert_eq!(restored.password_hash, "");
    }

    #[test]
    fn test_usable_password_requires_a_stored_hash() {
        let user = sample_user();
        assert!(user.has_usable_password());

        let social = User {
            password_hash: String::new(),
            ..sample_user()
        };
        assert!(!social.has_usable_password());

        // Snapshots drop the hash, so a restored user never reports a
        // usable password regardless of the canonical row.
        let restored: User =
            serde_json::from_str(&serde_json::to_string(&user).unwrap()).unwrap();
        assert!(!restored.has_usable_password());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str_or_default("admin"), Role::Admin);
        assert_eq!(Role::from_str_or_default("user"), Role::User);
        assert_eq!(Role::from_str_or_default("moderator"), Role::User);
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_role_serde_form() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn test_role_allowed_is_pure_membership() {
        assert!(role_allowed(&[Role::Admin], Role::Admin));
        assert!(!role_allowed(&[Role::Admin], Role::User));
        assert!(role_allowed(&[Role::Admin, Role::User], Role::User));
        assert!(!role_allowed(&[], Role::Admin));
    }
}
