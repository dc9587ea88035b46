/// Role value granting universal read/write access
pub const ADMIN_ROLE: &str = "mcp.admin";

/// Authenticated caller identity
///
/// Carried through the request pipeline as an axum extension. Role
/// values compare case-insensitively everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable user identifier from the identity provider
    pub user_id: String,
    /// Display name
    pub user_name: String,
    /// Role values held by the caller
    pub roles: Vec<String>,
}

impl Principal {
    /// Create a principal with the given identity and roles
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            roles,
        }
    }

    /// Whether the principal holds the given role (case-insensitive)
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Whether the principal holds the administrator role
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Operation kinds evaluated by the permission layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// View a resource or proxy traffic to it
    Read,
    /// Mutate or delete a resource
    Write,
}
