use actix_web::{HttpResponse, web};
use serde_json::Value;
use sqlx::PgPool;

use super::attachments::{finish, reconcile};
use super::multipart::read_update_form;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::attachment::{self, AttachmentOwner, AttachmentsResponse, FileStore};
use crate::models::project;
use crate::models::proposal::{
    self, NewProposal, PatchResponse, ProposalFields, ProposalPatch, TransitionPlan,
    ensure_mutable, merge_amount_options, plan_transition,
};

/// Whether a status write must insert the Project in the same transaction.
pub fn should_auto_create(plan: TransitionPlan, auto_create: bool, existing_project: Option<i64>) -> bool {
    plan == TransitionPlan::Confirm && auto_create && existing_project.is_none()
}

/// GET /api/proposals/{id}
pub async fn read(pool: web::Data<PgPool>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let proposal = proposal::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(proposal))
}

/// POST /api/proposals
pub async fn create(
    pool: web::Data<PgPool>,
    body: web::Json<NewProposal>,
) -> Result<HttpResponse, AppError> {
    let errors = body.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let id = proposal::create(&pool, &body).await?;
    let created = proposal::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    log::info!("proposal {id} created for {}", created.customer_name);
    Ok(HttpResponse::Created().json(created))
}

/// PATCH /api/proposals/{id}: status and/or amount options.
pub async fn patch(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    body: web::Json<ProposalPatch>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = body.into_inner();
    if patch.is_empty() {
        return Err(AppError::validation("Nothing to update"));
    }

    let mut tx = pool.begin().await?;
    let mut current = proposal::find_for_update(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_mutable(&current)?;

    if let Some(incoming) = &patch.amount_options {
        let merged = merge_amount_options(&current.amount_options, incoming);
        if merged != current.amount_options {
            proposal::set_amount_options(&mut tx, id, &merged).await?;
            current.amount_options = merged;
        }
    }

    let mut project_created = false;
    if let Some(next) = patch.status {
        let plan = plan_transition(current.status, next)?;
        proposal::set_status(&mut tx, id, next).await?;
        current.status = next;

        let existing = match plan {
            TransitionPlan::Confirm => project::find_id_by_proposal(&mut tx, id).await?,
            TransitionPlan::Persist(_) => None,
        };
        if should_auto_create(plan, config.auto_create_project, existing) {
            let project_id = project::create_from_proposal(&mut tx, &current).await?;
            project_created = true;
            log::info!("proposal {id} confirmed, project {project_id} created automatically");
        }
    }

    tx.commit().await?;
    Ok(HttpResponse::Ok().json(PatchResponse { proposal: current, project_created }))
}

/// PUT /api/proposals/{id}: scalar fields plus attachment reconciliation.
pub async fn update(
    pool: web::Data<PgPool>,
    store: web::Data<FileStore>,
    path: web::Path<i64>,
    payload: actix_multipart::Multipart,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let form = read_update_form(payload).await?;
    let fields: ProposalFields = serde_json::from_value(Value::Object(form.data.clone()))
        .map_err(|e| AppError::validation(format!("Invalid proposal fields: {e}")))?;
    let errors = fields.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let mut tx = pool.begin().await?;
    let mut current = proposal::find_for_update(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_mutable(&current)?;

    if !fields.is_empty() {
        fields.apply_to(&mut current);
        proposal::update_scalars(&mut tx, &current).await?;
    }

    let owner = AttachmentOwner::Proposal(id);
    let reconciled = reconcile(&mut tx, &store, owner, &form).await?;
    let attachments = finish(tx, &store, owner, reconciled).await?;
    Ok(HttpResponse::Ok().json(AttachmentsResponse { attachments }))
}

/// DELETE /api/proposals/{id}
pub async fn delete(
    pool: web::Data<PgPool>,
    store: web::Data<FileStore>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut tx = pool.begin().await?;
    let current = proposal::find_for_update(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_mutable(&current)?;

    let files = attachment::queries::delete_for_owner(&mut tx, AttachmentOwner::Proposal(id)).await?;
    proposal::delete(&mut tx, id).await?;
    tx.commit().await?;

    store.remove_all(files.iter().map(String::as_str)).await;
    log::info!("proposal {id} deleted with {} attachment(s)", files.len());
    Ok(HttpResponse::NoContent().finish())
}
