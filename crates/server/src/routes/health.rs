use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::get,
};
use deployment::Deployment;
use serde_json::json;
use services::services::database_validator::DatabaseValidator;

use crate::{DeploymentImpl, error::ApiError};

/// GET /health
pub async fn health(State(deployment): State<DeploymentImpl>) -> Result<Response, ApiError> {
    let validation = DatabaseValidator::new(deployment.db().pool.clone())
        .validate()
        .await?;

    let (status, label) = if validation.is_ok() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    Ok((
        status,
        ResponseJson(json!({
            "status": label,
            "migrations_applied": validation.migrations_applied,
            "missing_tables": validation.missing_tables,
        })),
    )
        .into_response())
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health))
}
