//! HTTP-facing error type and the JSON response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::ShopError;

/// Standard JSON envelope returned by every route.
#[derive(Serialize, ToSchema, Debug)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ShopError> for AppError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::NotFound | ShopError::Database(diesel::result::Error::NotFound) => {
                AppError::NotFound
            }
            ShopError::Validation(msg) => AppError::BadRequest(msg),
            ShopError::InvalidState(msg) => AppError::Conflict(msg),
            ShopError::Database(err) => AppError::Other(err.into()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't leak internals to clients
        let message = match &self {
            AppError::Other(err) => {
                tracing::error!(error = ?err, "Request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = StdResponse::<(), String> {
            data: None,
            message: Some(message),
        };

        (status, Json(body)).into_response()
    }
}
