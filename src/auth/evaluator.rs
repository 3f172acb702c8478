//! Answers "may this user do X on page Y" from an explicitly passed [`User`].
//!
//! There is no ambient current user: callers resolve the user once (admin flag
//! plus assigned role) and hand it to every check.

use crate::auth::permission::{Action, Actions, PermissionMatrix, PAGES};
use crate::errors::AppError;
use crate::models::role::Role;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
    permissions: PermissionMatrix,
}

impl User {
    pub fn admin(id: i64, name: impl Into<String>) -> Self {
        User {
            id,
            name: name.into(),
            is_admin: true,
            permissions: PermissionMatrix::full(),
        }
    }

    /// A non-admin user resolved from their assigned role. No role means no
    /// permissions at all.
    pub fn with_role(id: i64, name: impl Into<String>, role: Option<&Role>) -> Self {
        let permissions = role
            .map(|r| PermissionMatrix::new(r.permissions.clone()))
            .unwrap_or_default();
        User {
            id,
            name: name.into(),
            is_admin: false,
            permissions,
        }
    }

    pub fn permissions(&self) -> &PermissionMatrix {
        &self.permissions
    }
}

pub fn has_permission(user: &User, page: &str, action: Action) -> bool {
    if user.is_admin {
        return true;
    }
    user.permissions.actions_for(page).get(action)
}

/// All four bits for one page; unknown pages are all-false.
pub fn actions_for(user: &User, page: &str) -> Actions {
    if user.is_admin {
        return Actions::ALL;
    }
    user.permissions.actions_for(page)
}

/// Routes the user may view, in permission-list order.
pub fn accessible_routes(user: &User) -> Vec<String> {
    if user.is_admin {
        return PAGES.iter().map(|p| p.url.to_string()).collect();
    }
    user.permissions
        .entries()
        .iter()
        .filter(|e| e.actions.view)
        .map(|e| e.url.clone())
        .collect()
}

/// First accessible route, or `None` when the caller must fall back to the
/// unauthenticated landing state.
pub fn default_route(user: &User) -> Option<String> {
    accessible_routes(user).into_iter().next()
}

/// Check permission; returns Err(AppError) if denied.
pub fn require_permission(user: &User, page: &str, action: Action) -> Result<(), AppError> {
    if has_permission(user, page, action) {
        Ok(())
    } else {
        log::debug!("user {} denied {action} on {page}", user.id);
        Err(AppError::PermissionDenied(format!("{page}.{action}")))
    }
}
