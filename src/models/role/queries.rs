use sqlx::PgPool;
use sqlx::types::Json;

use super::types::{Role, RoleForm};
use crate::auth::permission::PagePermission;
use crate::errors::AppError;

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    permissions: Json<Vec<PagePermission>>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
            permissions: row.permissions.0,
        }
    }
}

/// Map a unique-name violation to `Conflict`, everything else passes through.
fn map_unique(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(format!("A role named '{name}' already exists"));
        }
    }
    AppError::from(e)
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<Role>, AppError> {
    let rows = sqlx::query_as::<_, RoleRow>("SELECT id, name, permissions FROM roles ORDER BY name, id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Role::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Role>, AppError> {
    let row = sqlx::query_as::<_, RoleRow>("SELECT id, name, permissions FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Role::from))
}

/// Insert a validated role. Returns the new id.
pub async fn create(pool: &PgPool, form: &RoleForm) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO roles (name, permissions) VALUES ($1, $2) RETURNING id",
    )
    .bind(&form.name)
    .bind(Json(&form.permissions))
    .fetch_one(pool)
    .await
    .map_err(|e| map_unique(e, &form.name))?;
    Ok(row.0)
}

pub async fn update(pool: &PgPool, id: i64, form: &RoleForm) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE roles SET name = $1, permissions = $2 WHERE id = $3")
        .bind(&form.name)
        .bind(Json(&form.permissions))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_unique(e, &form.name))?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
