//! Site-wide visitor counter.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::get,
};
use deployment::Deployment;
use services::services::visitor_counter::{VisitorCount, VisitorCounterService};

use super::method_not_allowed;
use crate::{DeploymentImpl, error::ApiError};

/// GET /visitors
/// Current total, 0 before the first visit
pub async fn get_visitor_count(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<VisitorCount>, ApiError> {
    let count =
        VisitorCounterService::current(&deployment.db().pool, deployment.visitor_slug()).await?;
    Ok(ResponseJson(count))
}

/// POST /visitors
/// Count one visit and return the new total
pub async fn record_visitor(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<VisitorCount>, ApiError> {
    let count =
        VisitorCounterService::record_visit(&deployment.db().pool, deployment.visitor_slug())
            .await?;
    Ok(ResponseJson(count))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route(
        "/visitors",
        get(get_visitor_count)
            .post(record_visitor)
            .head(method_not_allowed)
            .fallback(method_not_allowed),
    )
}
