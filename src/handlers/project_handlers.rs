use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::validate;
use crate::errors::AppError;
use crate::models::project::{self, NewTask};
use crate::models::proposal::{self, ProposalStatus};

/// POST /api/projects/from-proposal/{id}
///
/// At most one project per proposal: a second call answers 409.
pub async fn from_proposal(pool: web::Data<PgPool>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let proposal_id = path.into_inner();
    let mut tx = pool.begin().await?;
    let source = proposal::find_for_update(&mut tx, proposal_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if source.status != ProposalStatus::Confirmed {
        return Err(AppError::Conflict(format!(
            "proposal {proposal_id} is {}, not Confirmed",
            source.status
        )));
    }
    if let Some(existing) = project::find_id_by_proposal(&mut tx, proposal_id).await? {
        return Err(AppError::Conflict(format!(
            "project {existing} already exists for proposal {proposal_id}"
        )));
    }
    let project_id = project::create_from_proposal(&mut tx, &source).await?;
    tx.commit().await?;

    log::info!("project {project_id} created from proposal {proposal_id}");
    let created = project::find_by_id(&pool, project_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/projects/{id}
pub async fn read(pool: web::Data<PgPool>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let found = project::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/projects/{id}/tasks
pub async fn create_task(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<NewTask>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    if let Some(err) = validate::validate_required(&body.title, "Title", 200) {
        return Err(AppError::validation(err));
    }
    let mut conn = pool.acquire().await?;
    if !project::queries::exists(&mut conn, project_id).await? {
        return Err(AppError::NotFound);
    }
    drop(conn);
    let task = project::create_task(&pool, project_id, &body).await?;
    Ok(HttpResponse::Created().json(task))
}
