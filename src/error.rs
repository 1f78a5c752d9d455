use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the storage layer, tagged with the step that failed
/// (for example `save_workout: insert exercise`).
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{op}: {source}")]
    Database {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{op}: {source}")]
    Pool {
        op: &'static str,
        #[source]
        source: r2d2::Error,
    },

    #[error("{op}: workout {id} not found")]
    NotFound { op: &'static str, id: i64 },

    #[error("{op}: deadline exceeded")]
    Timeout { op: &'static str },

    #[error("{op}: database busy: {source}")]
    Conflict {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{op}: worker task failed: {message}")]
    Task { op: &'static str, message: String },
}

impl StorageError {
    /// Wrap a SQLite error, classifying lock contention as a conflict.
    pub fn database(op: &'static str, source: rusqlite::Error) -> Self {
        match source.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                StorageError::Conflict { op, source }
            }
            _ => StorageError::Database { op, source },
        }
    }

    pub fn pool(op: &'static str, source: r2d2::Error) -> Self {
        StorageError::Pool { op, source }
    }

    pub fn op(&self) -> &'static str {
        match self {
            StorageError::Database { op, .. }
            | StorageError::Pool { op, .. }
            | StorageError::NotFound { op, .. }
            | StorageError::Timeout { op }
            | StorageError::Conflict { op, .. }
            | StorageError::Task { op, .. } => *op,
        }
    }
}

/// Per-field validation failures, keyed by JSON path (e.g. `exercises[0].sets`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.insert(field.into(), reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, reason) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {reason}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<Uuid>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
            correlation_id: None,
        }
    }

    fn internal(correlation_id: Uuid) -> Self {
        Self {
            error: "internal error".to_string(),
            fields: None,
            correlation_id: Some(correlation_id),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid request".to_string(),
                    fields: Some(fields),
                    correlation_id: None,
                },
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::message(msg)),
            AppError::Storage(StorageError::NotFound { .. }) => (
                StatusCode::NOT_FOUND,
                ErrorBody::message("workout not found"),
            ),
            AppError::Storage(e @ StorageError::Timeout { .. }) => {
                tracing::warn!(op = e.op(), "Storage deadline exceeded");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorBody::message("request timed out"),
                )
            }
            AppError::Storage(e @ StorageError::Conflict { .. }) => {
                tracing::warn!(op = e.op(), "Storage conflict: {:?}", e);
                (
                    StatusCode::CONFLICT,
                    ErrorBody::message("database busy, retry later"),
                )
            }
            AppError::Storage(e) => {
                let correlation_id = Uuid::new_v4();
                tracing::error!(%correlation_id, op = e.op(), "Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::internal(correlation_id),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
pub type StorageResult<T> = std::result::Result<T, StorageError>;
