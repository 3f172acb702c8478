//! Role management through the backend, guarded by the `Roles` page.

use super::backend::Backend;
use crate::auth::evaluator::{User, require_permission};
use crate::auth::permission::{Action, ROLES};
use crate::errors::AppError;
use crate::models::role::{Role, RoleForm};

pub async fn list_roles(backend: &dyn Backend, user: &User) -> Result<Vec<Role>, AppError> {
    require_permission(user, ROLES.name, Action::View)?;
    backend.list_roles().await
}

/// Create (`id == None`) or update a role. The form is validated and
/// normalised before it is sent; the backend validates it again.
pub async fn save_role(
    backend: &dyn Backend,
    user: &User,
    id: Option<i64>,
    form: RoleForm,
) -> Result<Role, AppError> {
    let action = if id.is_some() { Action::Edit } else { Action::Create };
    require_permission(user, ROLES.name, action)?;
    let form = form.into_validated()?;
    let role = match id {
        Some(id) => backend.update_role(id, &form).await?,
        None => backend.create_role(&form).await?,
    };
    log::info!("role {} '{}' saved by user {}", role.id, role.name, user.id);
    Ok(role)
}

pub async fn delete_role(backend: &dyn Backend, user: &User, id: i64) -> Result<(), AppError> {
    require_permission(user, ROLES.name, Action::Delete)?;
    backend.delete_role(id).await?;
    log::info!("role {id} deleted by user {}", user.id);
    Ok(())
}
