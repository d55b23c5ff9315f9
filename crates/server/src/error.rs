use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::services::{
    content_views::ContentViewsError, database_validator::DatabaseValidationError,
    visitor_counter::VisitorCounterError,
};
use thiserror::Error;
use tracing::error;

/// Body of every storage failure. Details only go to the log.
pub const STORAGE_UNAVAILABLE: &str = "storage unavailable";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    VisitorCounter(#[from] VisitorCounterError),
    #[error(transparent)]
    ContentViews(#[from] ContentViewsError),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::ContentViews(ContentViewsError::InvalidSlug(reason)) => {
                (StatusCode::BAD_REQUEST, format!("invalid slug: {reason}"))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::VisitorCounter(_)
            | ApiError::ContentViews(_)
            | ApiError::DatabaseValidation(_)
            | ApiError::Database(_) => {
                error!(error = %self, "Storage request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    STORAGE_UNAVAILABLE.to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
