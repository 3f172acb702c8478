use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use super::types::*;
use crate::errors::AppError;
use crate::models::attachment::{self, AttachmentOwner};

const SELECT_PROPOSAL: &str = "SELECT id, customer_name, customer_email, customer_phone, address, \
            service, description, size, amount, amount_options, status, comment, date \
     FROM proposals";

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: i64,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    address: String,
    service: String,
    description: String,
    size: String,
    amount: f64,
    amount_options: Vec<String>,
    status: String,
    comment: String,
    date: NaiveDate,
}

impl ProposalRow {
    fn into_proposal(self) -> Result<Proposal, AppError> {
        let status: ProposalStatus = self.status.parse().map_err(|_| {
            AppError::Unexpected(format!("proposal {} has unknown status '{}'", self.id, self.status))
        })?;
        let service: Service = self.service.parse().map_err(|_| {
            AppError::Unexpected(format!("proposal {} has unknown service '{}'", self.id, self.service))
        })?;
        Ok(Proposal {
            id: self.id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            address: self.address,
            service,
            description: self.description,
            size: self.size,
            amount: self.amount,
            amount_options: self.amount_options,
            status,
            comment: self.comment,
            date: self.date,
            attachments: Vec::new(),
        })
    }
}

/// Load a proposal with its attachments.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Proposal>, AppError> {
    let mut conn = pool.acquire().await?;
    load(&mut conn, id, false).await
}

/// Same as `find_by_id` but row-locks the proposal for the caller's
/// transaction, so status checks and writes see one snapshot.
pub async fn find_for_update(conn: &mut PgConnection, id: i64) -> Result<Option<Proposal>, AppError> {
    load(conn, id, true).await
}

async fn load(conn: &mut PgConnection, id: i64, lock: bool) -> Result<Option<Proposal>, AppError> {
    let sql = if lock {
        format!("{SELECT_PROPOSAL} WHERE id = $1 FOR UPDATE")
    } else {
        format!("{SELECT_PROPOSAL} WHERE id = $1")
    };
    let row = sqlx::query_as::<_, ProposalRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut proposal = row.into_proposal()?;
    proposal.attachments = attachment::queries::list_for_owner(conn, AttachmentOwner::Proposal(id)).await?;
    Ok(Some(proposal))
}

/// Insert a validated proposal with status `Hot`. Returns the new id.
pub async fn create(pool: &PgPool, p: &NewProposal) -> Result<i64, AppError> {
    let date = p.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO proposals
             (customer_name, customer_email, customer_phone, address, service,
              description, size, amount, amount_options, status, comment, date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '{}', $9, $10, $11)
         RETURNING id",
    )
    .bind(p.customer_name.trim())
    .bind(p.customer_email.trim())
    .bind(p.customer_phone.trim())
    .bind(p.address.trim())
    .bind(p.service.as_str())
    .bind(&p.description)
    .bind(p.size.trim())
    .bind(p.amount)
    .bind(ProposalStatus::Hot.as_str())
    .bind(&p.comment)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn set_status(conn: &mut PgConnection, id: i64, status: ProposalStatus) -> Result<(), AppError> {
    sqlx::query("UPDATE proposals SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn set_amount_options(conn: &mut PgConnection, id: i64, options: &[String]) -> Result<(), AppError> {
    sqlx::query("UPDATE proposals SET amount_options = $1 WHERE id = $2")
        .bind(options)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Write back every scalar column of `proposal` (status and options excluded).
pub async fn update_scalars(conn: &mut PgConnection, proposal: &Proposal) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE proposals
         SET customer_name = $1, customer_email = $2, customer_phone = $3, address = $4,
             service = $5, description = $6, size = $7, amount = $8, comment = $9, date = $10
         WHERE id = $11",
    )
    .bind(&proposal.customer_name)
    .bind(&proposal.customer_email)
    .bind(&proposal.customer_phone)
    .bind(&proposal.address)
    .bind(proposal.service.as_str())
    .bind(&proposal.description)
    .bind(&proposal.size)
    .bind(proposal.amount)
    .bind(&proposal.comment)
    .bind(proposal.date)
    .bind(proposal.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
