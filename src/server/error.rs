//! Errors returned by the HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::prismic::ApiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("content API error: {0}")]
    Upstream(#[from] ApiError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ServerError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Upstream(err) if err.is_not_found() => {
                (StatusCode::NOT_FOUND, "not found".to_string())
            }
            ServerError::Upstream(err) => {
                tracing::error!("Content API request failed: {}", err);
                (StatusCode::BAD_GATEWAY, "content API unavailable".to_string())
            }
            ServerError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}
