//! Parsing of the multipart body shared by every attachment update endpoint.

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::attachment::{AttachmentField, LocalFile};

/// Largest single file accepted.
pub const MAX_FILE_BYTES: usize = 25 * 1024 * 1024;

/// Decoded update: scalar fields from the `data` part, the removal manifest
/// from `removeAttachments` and every file part.
#[derive(Debug, Default)]
pub struct UpdateForm {
    pub data: Map<String, Value>,
    pub remove: Vec<String>,
    pub files: Vec<LocalFile>,
}

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::validation(format!("Malformed upload: {e}"))
}

pub async fn read_update_form(mut payload: Multipart) -> Result<UpdateForm, AppError> {
    let mut form = UpdateForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|f| f.to_string());
        let mimetype = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if bytes.len() + chunk.len() > MAX_FILE_BYTES {
                return Err(AppError::validation(format!(
                    "File '{}' exceeds the {} MB limit",
                    filename.as_deref().unwrap_or(&name),
                    MAX_FILE_BYTES / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "data" => {
                form.data = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::validation(format!("Invalid data part: {e}")))?;
            }
            "removeAttachments" => {
                form.remove = parse_remove_manifest(&bytes)?;
            }
            other => {
                let field = AttachmentField::from_form_name(other)
                    .ok_or_else(|| AppError::validation(format!("Unexpected form field '{other}'")))?;
                let Some(filename) = filename else {
                    return Err(AppError::validation(format!("File part '{other}' has no filename")));
                };
                form.files.push(LocalFile::new(filename, mimetype, bytes).in_field(field));
            }
        }
    }

    Ok(form)
}

/// `removeAttachments` is a JSON array of storage names. Blank entries are
/// dropped; an empty part means nothing to remove.
pub fn parse_remove_manifest(bytes: &[u8]) -> Result<Vec<String>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let names: Vec<String> = serde_json::from_slice(bytes)
        .map_err(|e| AppError::validation(format!("removeAttachments must be a JSON array of names: {e}")))?;
    Ok(names.into_iter().filter(|n| !n.trim().is_empty()).collect())
}
