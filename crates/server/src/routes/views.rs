//! View counters for individual posts, projects and stories.

use std::str::FromStr;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::content_meta::{ContentMeta, ContentType};
use deployment::Deployment;
use serde::Deserialize;
use services::services::content_views::{ContentViews, ContentViewsService};

use super::method_not_allowed;
use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RecordViewRequest {
    #[serde(rename = "type")]
    pub content_type: ContentType,
}

#[derive(Debug, Deserialize)]
pub struct ListViewsQuery {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

/// GET /views/{slug}
pub async fn get_views(
    State(deployment): State<DeploymentImpl>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ContentViews>, ApiError> {
    let views = ContentViewsService::get(&deployment.db().pool, &slug).await?;
    Ok(ResponseJson(views))
}

/// POST /views/{slug}
/// Body `{"type": "..."}` is optional and only used when the slug is new
pub async fn record_view(
    State(deployment): State<DeploymentImpl>,
    Path(slug): Path<String>,
    body: Bytes,
) -> Result<ResponseJson<ContentViews>, ApiError> {
    let content_type = if body.iter().all(u8::is_ascii_whitespace) {
        ContentType::Blog
    } else {
        serde_json::from_slice::<RecordViewRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?
            .content_type
    };

    let views = ContentViewsService::record_view(&deployment.db().pool, &slug, content_type).await?;
    Ok(ResponseJson(views))
}

/// GET /views?type=blog
/// Most viewed first
pub async fn list_views(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<ListViewsQuery>,
) -> Result<ResponseJson<Vec<ContentMeta>>, ApiError> {
    let content_type = match query.content_type.as_deref() {
        None => ContentType::Blog,
        Some(raw) => ContentType::from_str(raw)
            .map_err(|_| ApiError::BadRequest(format!("unknown content type: {raw}")))?,
    };

    let records = ContentViewsService::list(&deployment.db().pool, content_type).await?;
    Ok(ResponseJson(records))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/views", get(list_views)).route(
        "/views/{slug}",
        get(get_views)
            .post(record_view)
            .head(method_not_allowed)
            .fallback(method_not_allowed),
    )
}
