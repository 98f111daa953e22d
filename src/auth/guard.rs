//! Role-based authorization.
//!
//! Every guarded operation declares the set of roles allowed to perform it in
//! [`policy`]. The caller's role always comes from the stored user row loaded by
//! [`CurrentUser`](super::CurrentUser), never from token claims.

use crate::error::AppError;
use crate::models::{Role, User};

/// A declared set of roles permitted to perform an operation.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(&'static [Role]);

impl AllowedRoles {
    pub const fn new(roles: &'static [Role]) -> Self {
        Self(roles)
    }

    pub fn permits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Fails with `Forbidden` when the user's role is outside the set.
    pub fn check(&self, user: &User) -> Result<(), AppError> {
        if self.permits(user.role) {
            Ok(())
        } else {
            log::warn!(
                "user {} with role {} denied access",
                user.id,
                user.role.as_str()
            );
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".into(),
            ))
        }
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }
}

/// Allowed-sets per operation.
pub mod policy {
    use super::AllowedRoles;
    use crate::models::Role::{Admin, Contributor, Manager};

    /// Create, update and delete projects.
    pub const MANAGE_PROJECTS: AllowedRoles = AllowedRoles::new(&[Admin, Manager]);
    /// Create and update tasks, change task status.
    pub const WRITE_TASKS: AllowedRoles = AllowedRoles::new(&[Admin, Manager, Contributor]);
    pub const DELETE_TASKS: AllowedRoles = AllowedRoles::new(&[Admin, Manager]);
    pub const LIST_USERS: AllowedRoles = AllowedRoles::new(&[Admin]);
    pub const VIEW_USER: AllowedRoles = AllowedRoles::new(&[Admin, Manager]);
    /// Create, update, re-role and deactivate users.
    pub const MANAGE_USERS: AllowedRoles = AllowedRoles::new(&[Admin]);
}
