use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

/// Caller identity as resolved by the identity collaborator for one request.
/// `groups` is the only source of roles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerUser {
    pub user_id: String,
    pub username: String,
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl ServerUser {
    /// Case-insensitive membership test against `groups`.
    pub fn has_role(&self, role: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn display_name(&self) -> &str {
        self.preferred_username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// A user pool account as listed by the admin screens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    pub username: String,
    pub email: Option<String>,
    pub preferred_username: Option<String>,
    pub enabled: bool,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub group_name: String,
    pub description: Option<String>,
}

/// Result of a group membership change.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub username: String,
    pub group_name: String,
    pub member: bool,
}
