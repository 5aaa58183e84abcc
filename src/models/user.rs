//! Authenticated user model.

use serde::{Deserialize, Serialize};

/// What a user is allowed to do with the roster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

/// The identity returned by the authentication collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl User {
    /// Build a user, deriving the display name from the username when none is given.
    pub fn new(username: impl Into<String>, display_name: Option<String>, role: Role) -> Self {
        let username = username.into();
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                username
                    .split('@')
                    .next()
                    .unwrap_or(username.as_str())
                    .to_string()
            });
        Self {
            username,
            display_name,
            role,
        }
    }

    /// The read-only guest used by view-only mode.
    pub fn guest() -> Self {
        Self {
            username: "guest".to_string(),
            display_name: "Guest".to_string(),
            role: Role::Viewer,
        }
    }
}

/// Response body of the session probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_email() {
        let user = User::new("ana.rios@example.com", None, Role::Admin);
        assert_eq!(user.display_name, "ana.rios");
    }

    #[test]
    fn test_explicit_display_name_wins() {
        let user = User::new("ana@example.com", Some("Ana".to_string()), Role::Admin);
        assert_eq!(user.display_name, "Ana");

        let user = User::new("ana@example.com", Some("  ".to_string()), Role::Admin);
        assert_eq!(user.display_name, "ana");
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"viewer\"");
    }
}
