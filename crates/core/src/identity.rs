//! Acting identity supplied by the external identity provider.

use colloquy_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
    pub display_name: String,
    pub role: String,
}

impl Actor {
    /// Create an actor.
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            role: role.into(),
        }
    }

    /// Whether the actor carries a usable identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}

/// Reject missing or blank identities with [`AppError::Unauthorized`].
pub fn require_actor(actor: Option<&Actor>) -> AppResult<&Actor> {
    actor
        .filter(|actor| actor.is_authenticated())
        .ok_or(AppError::Unauthorized)
}

/// Roles allowed to moderate (delete any comment).
///
/// Matching ignores ASCII case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedRoles(Vec<String>);

impl PrivilegedRoles {
    /// Build from a list of role names.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            roles
                .into_iter()
                .map(|role| role.into().trim().to_string())
                .filter(|role| !role.is_empty())
                .collect(),
        )
    }

    /// Whether `role` is privileged.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        let role = role.trim();
        self.0.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

impl Default for PrivilegedRoles {
    fn default() -> Self {
        Self::new(["Admin", "Administrator"])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_actor() {
        let actor = Actor::new("alice", "Alice", "Member");
        assert_eq!(require_actor(Some(&actor)).unwrap().user_id, "alice");

        assert!(matches!(require_actor(None), Err(AppError::Unauthorized)));

        let blank = Actor::new("  ", "Nobody", "Member");
        assert!(matches!(
            require_actor(Some(&blank)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_privileged_roles_default() {
        let roles = PrivilegedRoles::default();
        assert!(roles.contains("Admin"));
        assert!(roles.contains("administrator"));
        assert!(!roles.contains("Member"));
        assert!(!roles.contains(""));
    }

    #[test]
    fn test_privileged_roles_custom() {
        let roles = PrivilegedRoles::new(vec!["Moderator".to_string(), "  ".to_string()]);
        assert!(roles.contains(" moderator "));
        assert!(!roles.contains("Admin"));
        assert!(!roles.contains(" "));
    }
}
