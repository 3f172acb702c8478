use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::role::{self, Role, RoleForm};

/// GET /api/roles
pub async fn list(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let roles = role::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(roles))
}

/// GET /api/roles/{id}
pub async fn read(pool: web::Data<PgPool>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let found = role::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/roles
///
/// Validated again here: a role with no action on any page is refused even
/// when the client let it through.
pub async fn create(pool: web::Data<PgPool>, body: web::Json<RoleForm>) -> Result<HttpResponse, AppError> {
    let form = body.into_inner().into_validated()?;
    let id = role::create(&pool, &form).await?;
    log::info!("role {id} '{}' created", form.name);
    Ok(HttpResponse::Created().json(Role { id, name: form.name, permissions: form.permissions }))
}

/// PUT /api/roles/{id}
pub async fn update(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<RoleForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let form = body.into_inner().into_validated()?;
    role::update(&pool, id, &form).await?;
    log::info!("role {id} '{}' updated", form.name);
    Ok(HttpResponse::Ok().json(Role { id, name: form.name, permissions: form.permissions }))
}

/// DELETE /api/roles/{id}
pub async fn delete(pool: web::Data<PgPool>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    role::delete(&pool, id).await?;
    log::info!("role {id} deleted");
    Ok(HttpResponse::NoContent().finish())
}
