use crate::matrix::ValidationErrors;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid data: {0}")]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Analysis service error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("Internal server error: {0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    pub fn cell_taken() -> Self {
        ApiError::Conflict(
            "An impact already exists for this activity and environmental component".to_string(),
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

/// Storage errors. A unique-index violation means the matrix cell is taken.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let unique_violation = err
            .downcast_ref::<DbErr>()
            .and_then(|e| e.sql_err())
            .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)));
        if unique_violation {
            return ApiError::cell_taken();
        }
        ApiError::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(details) => json!({
                "error": "Invalid data",
                "details": details,
            }),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                json!({ "error": msg })
            }
            ApiError::Upstream(err) => {
                error!(error=%format!("{err:#}"), "analysis service call failed");
                json!({ "error": "The analysis service failed, please try again later" })
            }
            ApiError::Internal(err) => {
                error!(error=%format!("{err:#}"), "internal error");
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
