use actix_web::{HttpResponse, web};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::multipart::{UpdateForm, read_update_form};
use crate::errors::AppError;
use crate::models::attachment::{
    self, Attachment, AttachmentOwner, AttachmentsResponse, FileStore, apply_reconciliation,
};
use crate::models::project;

/// Result of reconciling one owner inside an open transaction. Files are on
/// disk already; the transaction decides whether they stay.
pub struct Reconciled {
    pub attachments: Vec<Attachment>,
    stored: Vec<String>,
    dropped: Vec<String>,
}

/// Store the new files and rewrite the owner's list within `conn`.
pub async fn reconcile(
    conn: &mut PgConnection,
    store: &FileStore,
    owner: AttachmentOwner,
    form: &UpdateForm,
) -> Result<Reconciled, AppError> {
    let current = attachment::queries::list_for_owner(conn, owner).await?;
    let dropped: Vec<String> = current
        .iter()
        .filter(|a| form.remove.contains(&a.filename))
        .map(|a| a.filename.clone())
        .collect();

    let stored = store.put_all(&form.files).await?;
    let stored_names: Vec<String> = stored.iter().map(|a| a.filename.clone()).collect();
    let next = apply_reconciliation(&current, &form.remove, stored);

    if let Err(e) = attachment::queries::replace_for_owner(conn, owner, &next).await {
        store.remove_all(stored_names.iter().map(String::as_str)).await;
        return Err(e);
    }
    Ok(Reconciled { attachments: next, stored: stored_names, dropped })
}

/// Commit, then delete dropped files. A failed commit removes the files
/// written for it instead.
pub async fn finish(
    tx: Transaction<'_, Postgres>,
    store: &FileStore,
    owner: AttachmentOwner,
    reconciled: Reconciled,
) -> Result<Vec<Attachment>, AppError> {
    if let Err(e) = tx.commit().await {
        store.remove_all(reconciled.stored.iter().map(String::as_str)).await;
        return Err(e.into());
    }
    store.remove_all(reconciled.dropped.iter().map(String::as_str)).await;
    log::info!(
        "{} {} attachments: {} added, {} removed",
        owner.kind(),
        owner.id(),
        reconciled.stored.len(),
        reconciled.dropped.len()
    );
    Ok(reconciled.attachments)
}

/// Attachment-only update shared by projects and tasks.
async fn update_owner(
    pool: &PgPool,
    store: &FileStore,
    owner: AttachmentOwner,
    form: UpdateForm,
) -> Result<HttpResponse, AppError> {
    if !form.data.is_empty() {
        log::debug!("{} {}: ignoring scalar fields on attachment update", owner.kind(), owner.id());
    }
    let mut tx = pool.begin().await?;
    let found = match owner {
        AttachmentOwner::Project(id) => project::queries::exists(&mut tx, id).await?,
        AttachmentOwner::Task(id) => project::queries::task_exists(&mut tx, id).await?,
        AttachmentOwner::Proposal(_) => {
            return Err(AppError::Unexpected("proposal updates go through the proposal handler".into()));
        }
    };
    if !found {
        return Err(AppError::NotFound);
    }
    let reconciled = reconcile(&mut tx, store, owner, &form).await?;
    let attachments = finish(tx, store, owner, reconciled).await?;
    Ok(HttpResponse::Ok().json(AttachmentsResponse { attachments }))
}

/// PUT /api/projects/{id}
pub async fn update_project(
    pool: web::Data<PgPool>,
    store: web::Data<FileStore>,
    path: web::Path<i64>,
    payload: actix_multipart::Multipart,
) -> Result<HttpResponse, AppError> {
    let form = read_update_form(payload).await?;
    update_owner(&pool, &store, AttachmentOwner::Project(path.into_inner()), form).await
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    pool: web::Data<PgPool>,
    store: web::Data<FileStore>,
    path: web::Path<i64>,
    payload: actix_multipart::Multipart,
) -> Result<HttpResponse, AppError> {
    let form = read_update_form(payload).await?;
    update_owner(&pool, &store, AttachmentOwner::Task(path.into_inner()), form).await
}
