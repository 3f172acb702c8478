use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::types::*;
use crate::errors::AppError;
use crate::models::attachment::{self, AttachmentOwner};
use crate::models::proposal::Proposal;

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    proposal_id: Option<i64>,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project, AppError> {
        let status: ProjectStatus = self.status.parse().map_err(|_| {
            AppError::Unexpected(format!("project {} has unknown status '{}'", self.id, self.status))
        })?;
        Ok(Project {
            id: self.id,
            proposal_id: self.proposal_id,
            name: self.name,
            status,
            created_at: self.created_at,
            attachments: Vec::new(),
        })
    }
}

/// Project name derived from its proposal, e.g. "Ada Lovelace - Painting".
pub fn name_from_proposal(proposal: &Proposal) -> String {
    format!("{} - {}", proposal.customer_name, proposal.service)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Project>, AppError> {
    let mut conn = pool.acquire().await?;
    let row = sqlx::query_as::<_, ProjectRow>(
        "SELECT id, proposal_id, name, status, created_at FROM projects WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut project = row.into_project()?;
    project.attachments =
        attachment::queries::list_for_owner(&mut conn, AttachmentOwner::Project(id)).await?;
    Ok(Some(project))
}

pub async fn exists(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

pub async fn find_id_by_proposal(conn: &mut PgConnection, proposal_id: i64) -> Result<Option<i64>, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM projects WHERE proposal_id = $1")
        .bind(proposal_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|r| r.0))
}

/// Insert the project spawned by a confirmed proposal. Returns the new id.
pub async fn create_from_proposal(conn: &mut PgConnection, proposal: &Proposal) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO projects (proposal_id, name, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(proposal.id)
    .bind(name_from_proposal(proposal))
    .bind(ProjectStatus::New.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.0)
}

pub async fn create_task(pool: &PgPool, project_id: i64, task: &NewTask) -> Result<Task, AppError> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO tasks (project_id, title) VALUES ($1, $2) RETURNING id",
    )
    .bind(project_id)
    .bind(task.title.trim())
    .fetch_one(pool)
    .await?;
    Ok(Task {
        id: row.0,
        project_id,
        title: task.title.trim().to_string(),
        attachments: Vec::new(),
    })
}

pub async fn task_exists(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}
