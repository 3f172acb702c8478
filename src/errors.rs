use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classes surfaced to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    LockedRecord,
    Validation,
    StorageUnavailable,
    TransientNetwork,
    Conflict,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Stable machine string used in JSON error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::LockedRecord => "locked_record",
            ErrorKind::Validation => "validation_error",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "permission_denied" => Some(ErrorKind::PermissionDenied),
            "locked_record" => Some(ErrorKind::LockedRecord),
            "validation_error" => Some(ErrorKind::Validation),
            "storage_unavailable" => Some(ErrorKind::StorageUnavailable),
            "transient_network" => Some(ErrorKind::TransientNetwork),
            "conflict" => Some(ErrorKind::Conflict),
            "not_found" => Some(ErrorKind::NotFound),
            "internal" => Some(ErrorKind::Internal),
            _ => None,
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::LockedRecord => StatusCode::LOCKED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::StorageUnavailable => StatusCode::INSUFFICIENT_STORAGE,
            ErrorKind::TransientNetwork => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    PermissionDenied(String),
    LockedRecord(String),
    Validation(Vec<String>),
    StorageUnavailable(String),
    TransientNetwork(String),
    Conflict(String),
    NotFound,
    Db(sqlx::Error),
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AppError::LockedRecord(_) => ErrorKind::LockedRecord,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            AppError::TransientNetwork(_) => ErrorKind::TransientNetwork,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Db(_) | AppError::Unexpected(_) => ErrorKind::Internal,
        }
    }

    /// Only network-class failures may be resent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientNetwork(_))
    }

    /// Build an error of the given class from a server-supplied message.
    pub fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::PermissionDenied => AppError::PermissionDenied(message),
            ErrorKind::LockedRecord => AppError::LockedRecord(message),
            ErrorKind::Validation => AppError::Validation(
                message
                    .split("; ")
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            ErrorKind::StorageUnavailable => AppError::StorageUnavailable(message),
            ErrorKind::TransientNetwork => AppError::TransientNetwork(message),
            ErrorKind::Conflict => AppError::Conflict(message),
            ErrorKind::NotFound => AppError::NotFound,
            ErrorKind::Internal => AppError::Unexpected(message),
        }
    }

    /// Text shown to the end user. Every class gets its own wording; only
    /// unclassified failures fall back to the generic message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::PermissionDenied(_) => {
                "You do not have permission to perform this action.".to_string()
            }
            AppError::LockedRecord(_) => {
                "This proposal is confirmed and can no longer be changed.".to_string()
            }
            AppError::Validation(errors) => format!("Please fix the following: {}", errors.join("; ")),
            AppError::StorageUnavailable(_) => {
                "Files could not be stored on the server.".to_string()
            }
            AppError::TransientNetwork(_) => {
                "The server could not be reached. Please try again.".to_string()
            }
            AppError::Conflict(_) => {
                "This record was changed by someone else. Reload and try again.".to_string()
            }
            AppError::NotFound => "The record no longer exists.".to_string(),
            AppError::Db(_) | AppError::Unexpected(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.join("; "),
            AppError::PermissionDenied(m)
            | AppError::LockedRecord(m)
            | AppError::StorageUnavailable(m)
            | AppError::TransientNetwork(m)
            | AppError::Conflict(m)
            | AppError::Unexpected(m) => m.clone(),
            AppError::NotFound => "Not found".to_string(),
            AppError::Db(_) => "Internal Server Error".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::PermissionDenied(e) => write!(f, "Permission denied: {e}"),
            AppError::LockedRecord(e) => write!(f, "Locked record: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::StorageUnavailable(e) => write!(f, "Storage unavailable: {e}"),
            AppError::TransientNetwork(e) => write!(f, "Network error: {e}"),
            AppError::Conflict(e) => write!(f, "Conflict: {e}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Unexpected(e) => write!(f, "Unexpected error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

/// JSON error body exchanged between the backend and the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.kind().status()
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            log::error!("{self}");
        }
        HttpResponse::build(kind.status()).json(ApiErrorBody {
            error: kind.as_str().to_string(),
            message: self.detail(),
        })
    }
}

/// Classify a non-success HTTP response. The `error` kind in a JSON body
/// wins; otherwise the status code decides.
pub fn classify_response(status: u16, body: &str) -> AppError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    let message = match &parsed {
        Some(b) if !b.message.is_empty() => b.message.clone(),
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("HTTP {status}"),
    };

    if let Some(kind) = parsed.as_ref().and_then(|b| ErrorKind::from_str_opt(&b.error)) {
        return AppError::from_kind(kind, message);
    }

    let kind = match status {
        403 => ErrorKind::PermissionDenied,
        423 => ErrorKind::LockedRecord,
        400 | 422 => ErrorKind::Validation,
        507 => ErrorKind::StorageUnavailable,
        409 => ErrorKind::Conflict,
        404 => ErrorKind::NotFound,
        408 | 429 => ErrorKind::TransientNetwork,
        s if s >= 500 => ErrorKind::TransientNetwork,
        _ => ErrorKind::Internal,
    };
    AppError::from_kind(kind, message)
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::Db(other),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return classify_response(status.as_u16(), "");
        }
        if e.is_decode() || e.is_builder() {
            AppError::Unexpected(e.to_string())
        } else {
            // timeouts, refused connections, dropped bodies
            AppError::TransientNetwork(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Unexpected(format!("JSON error: {e}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Unexpected(format!("I/O error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_kind_wins_over_status() {
        let body = r#"{"error":"locked_record","message":"proposal 7 is confirmed"}"#;
        let err = classify_response(409, body);
        assert_eq!(err.kind(), ErrorKind::LockedRecord);
        assert_eq!(err.to_string(), "Locked record: proposal 7 is confirmed");
    }

    #[test]
    fn status_fallback_classification() {
        assert_eq!(classify_response(423, "").kind(), ErrorKind::LockedRecord);
        assert_eq!(classify_response(507, "").kind(), ErrorKind::StorageUnavailable);
        assert_eq!(classify_response(502, "bad gateway").kind(), ErrorKind::TransientNetwork);
        assert_eq!(classify_response(422, "").kind(), ErrorKind::Validation);
        assert_eq!(classify_response(409, "").kind(), ErrorKind::Conflict);
        assert_eq!(classify_response(418, "").kind(), ErrorKind::Internal);
    }

    #[test]
    fn validation_message_splits_into_fields() {
        let body = r#"{"error":"validation_error","message":"Customer name is required; Amount must not be negative"}"#;
        match classify_response(400, body) {
            AppError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(AppError::TransientNetwork("timeout".into()).is_retryable());
        assert!(!AppError::validation("Amount is required").is_retryable());
        assert!(!AppError::Conflict("already confirmed".into()).is_retryable());
        assert!(!AppError::StorageUnavailable("no dir".into()).is_retryable());
    }

    #[test]
    fn every_kind_has_a_distinct_user_message() {
        let errors = [
            AppError::PermissionDenied(String::new()),
            AppError::LockedRecord(String::new()),
            AppError::validation("x"),
            AppError::StorageUnavailable(String::new()),
            AppError::TransientNetwork(String::new()),
            AppError::Conflict(String::new()),
            AppError::NotFound,
            AppError::Unexpected(String::new()),
        ];
        let mut messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }
}
