use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::error::StorageError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub message: String }

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self { Self::Storage(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, axum::Json(ErrorBody { message })).into_response(),
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                let status = if e.is_unavailable() { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::INTERNAL_SERVER_ERROR };
                (status, axum::Json(ErrorBody { message: e.to_string() })).into_response()
            }
        }
    }
}
