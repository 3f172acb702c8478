use serde::{Deserialize, Serialize};

use crate::auth::permission::{PagePermission, PermissionMatrix};
use crate::auth::validate;
use crate::errors::AppError;

/// A named set of page permissions assigned to non-admin users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PagePermission>,
}

/// Payload for creating or editing a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleForm {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PagePermission>,
}

impl RoleForm {
    pub fn from_matrix(name: impl Into<String>, matrix: PermissionMatrix) -> Self {
        RoleForm {
            name: name.into(),
            permissions: matrix.into_entries(),
        }
    }

    /// Collect every validation message; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = vec![];
        errors.extend(validate::validate_role_name(&self.name));
        for p in &self.permissions {
            errors.extend(validate::validate_required(&p.page, "Page name", 100));
            errors.extend(validate::validate_required(&p.url, "Page url", 200));
        }
        if !self.permissions.iter().any(|p| p.actions.any()) {
            errors.push("Select at least one permission".to_string());
        }
        errors
    }

    /// Validate, then trim the name and normalise the permission list
    /// through the matrix (cascade applied, duplicate pages merged).
    pub fn into_validated(self) -> Result<RoleForm, AppError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(RoleForm {
            name: self.name.trim().to_string(),
            permissions: PermissionMatrix::new(self.permissions).into_entries(),
        })
    }
}
