use sqlx::PgConnection;

use super::types::{Attachment, AttachmentField, AttachmentOwner};
use crate::errors::AppError;

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    field: String,
    filename: String,
    original_name: String,
    mimetype: String,
    url: String,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            field: AttachmentField::from_form_name(&row.field).unwrap_or_default(),
            filename: row.filename,
            original_name: row.original_name,
            mimetype: row.mimetype,
            url: row.url,
        }
    }
}

/// Attachments of one owner, in stored order.
pub async fn list_for_owner(
    conn: &mut PgConnection,
    owner: AttachmentOwner,
) -> Result<Vec<Attachment>, AppError> {
    let rows = sqlx::query_as::<_, AttachmentRow>(
        "SELECT field, filename, original_name, mimetype, url
         FROM attachments
         WHERE owner_kind = $1 AND owner_id = $2
         ORDER BY position, id",
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Attachment::from).collect())
}

/// Replace the stored list of one owner. Run inside the caller's transaction.
pub async fn replace_for_owner(
    conn: &mut PgConnection,
    owner: AttachmentOwner,
    attachments: &[Attachment],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM attachments WHERE owner_kind = $1 AND owner_id = $2")
        .bind(owner.kind())
        .bind(owner.id())
        .execute(&mut *conn)
        .await?;

    for (position, a) in attachments.iter().enumerate() {
        sqlx::query(
            "INSERT INTO attachments
                 (owner_kind, owner_id, field, filename, original_name, mimetype, url, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .bind(a.field.as_str())
        .bind(&a.filename)
        .bind(&a.original_name)
        .bind(&a.mimetype)
        .bind(&a.url)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Delete every attachment row of an owner, returning the storage names so
/// the caller can remove the files.
pub async fn delete_for_owner(
    conn: &mut PgConnection,
    owner: AttachmentOwner,
) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "DELETE FROM attachments WHERE owner_kind = $1 AND owner_id = $2 RETURNING filename",
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}
