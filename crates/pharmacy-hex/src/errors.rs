use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pharmacy_types::domain::validation::FieldError;
use pharmacy_types::ports::store::RepoError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] FieldError),

    #[error("Insufficient stock. Only {available} units available.")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

// Malformed bodies and query strings answer 400 with the JSON error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<i64>,
}

impl ErrorBody {
    fn message(error: String) -> Self {
        Self {
            error,
            field: None,
            available: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, body) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, ErrorBody::message(m.clone())),
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: e.message.clone(),
                    field: Some(e.field),
                    available: None,
                },
            ),
            AppError::InsufficientStock { available, .. } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                    field: Some("quantity"),
                    available: Some(*available),
                },
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, ErrorBody::message(m.clone())),
            AppError::Conflict(m) => (StatusCode::CONFLICT, ErrorBody::message(m.clone())),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "unhandled failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("internal error".into()),
                )
            }
        };

        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
