use std::time::Duration;

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use deployment::Deployment;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::DeploymentImpl;

pub mod health;
pub mod views;
pub mod visitors;

/// Methods accepted by the counter endpoints
pub const ALLOWED_METHODS: &str = "GET, POST";

/// Fallback for counter endpoints hit with anything but GET or POST
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        Json(json!({ "error": "method not allowed" })),
    )
}

pub fn router(deployment: DeploymentImpl) -> Router {
    let cors = cors_layer(&deployment.config().cors_allowed_origins);

    Router::new()
        .merge(visitors::router(&deployment))
        .merge(views::router(&deployment))
        .merge(health::router(&deployment))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(restrict_options))
        .with_state(deployment)
}

/// Paths whose allow list is exactly [`ALLOWED_METHODS`]
fn is_counter_path(path: &str) -> bool {
    path == "/visitors" || path.starts_with("/views/")
}

/// On counter paths only CORS preflights (requests carrying
/// `Access-Control-Request-Method`) may use OPTIONS. Anything else is a 405.
async fn restrict_options(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS || !is_counter_path(request.uri().path()) {
        return next.run(request).await;
    }
    if !request
        .headers()
        .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    {
        return method_not_allowed().await.into_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().remove(header::ALLOW);
    response
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}
