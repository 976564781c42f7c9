use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMINISTRATOR, ROLE_GUEST};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Subject of the access token
    pub user_id: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_administrator(&self) -> bool {
        self.has_role(ROLE_ADMINISTRATOR)
    }
}

/// Permission predicate applied to category reads.
///
/// Administrators see every category. Everyone else sees the categories on
/// which one of their roles holds the view permission; anonymous callers are
/// evaluated as the guest role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewScope {
    Unrestricted,
    Roles(Vec<String>),
}

impl ViewScope {
    pub fn for_user(user: Option<&AuthenticatedUser>) -> Self {
        match user {
            Some(u) if u.is_administrator() => ViewScope::Unrestricted,
            Some(u) if !u.roles.is_empty() => ViewScope::Roles(u.roles.clone()),
            _ => ViewScope::guest(),
        }
    }

    pub fn guest() -> Self {
        ViewScope::Roles(vec![ROLE_GUEST.to_string()])
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, ViewScope::Unrestricted)
    }

    /// Roles to bind into the permission sub-query (empty when unrestricted)
    pub fn roles(&self) -> &[String] {
        match self {
            ViewScope::Unrestricted => &[],
            ViewScope::Roles(roles) => roles,
        }
    }

    pub fn allows_any(&self, granted: &[&str]) -> bool {
        match self {
            ViewScope::Unrestricted => true,
            ViewScope::Roles(roles) => roles.iter().any(|r| granted.contains(&r.as_str())),
        }
    }
}
