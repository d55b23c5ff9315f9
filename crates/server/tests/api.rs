use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use db::{
    DBService,
    models::content_meta::{ContentMeta, ContentType},
};
use deployment::Deployment;
use local_deployment::LocalDeployment;
use serde_json::{Value, json};
use server::app;
use services::services::config::Config;
use tower::ServiceExt;

const VISITORS: &str = "site_total_visitors";

async fn test_deployment() -> LocalDeployment {
    let db = DBService::new_in_memory().await.unwrap();
    LocalDeployment::from_parts(Config::default(), db)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

#[tokio::test]
async fn get_visitors_defaults_to_zero() {
    let app = app(test_deployment().await);

    let (status, _, body) = send(&app, Method::GET, "/visitors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 0 }));
}

#[tokio::test]
async fn post_visitors_increments_and_get_reflects_it() {
    let deployment = test_deployment().await;
    let app = app(deployment.clone());

    let (status, _, body) = send(&app, Method::POST, "/visitors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));

    let (_, _, body) = send(&app, Method::POST, "/visitors", None).await;
    assert_eq!(body, json!({ "count": 2 }));

    for _ in 0..2 {
        let (status, _, body) = send(&app, Method::GET, "/visitors", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 2 }));
    }

    let record = ContentMeta::find_by_slug(&deployment.db().pool, VISITORS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.content_type, ContentType::Site);
}

#[tokio::test]
async fn other_methods_are_rejected_with_allow_header() {
    let app = app(test_deployment().await);

    for uri in ["/visitors", "/views/some-post"] {
        for method in [
            Method::DELETE,
            Method::PUT,
            Method::PATCH,
            Method::HEAD,
            Method::OPTIONS,
        ] {
            let (status, headers, _) = send(&app, method.clone(), uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            assert_eq!(headers.get(header::ALLOW).unwrap(), "GET, POST");
        }
    }
}

#[tokio::test]
async fn cors_preflight_is_answered_without_allow_header() {
    let app = app(test_deployment().await);

    for uri in ["/visitors", "/views/some-post"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "https://example.dev")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert!(response.status().is_success(), "{uri}");
        assert!(response.headers().get(header::ALLOW).is_none(), "{uri}");
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS)
        );
    }
}

#[tokio::test]
async fn storage_failure_is_a_generic_500() {
    let deployment = test_deployment().await;
    let app = app(deployment.clone());
    deployment.db().pool.close().await;

    for method in [Method::GET, Method::POST] {
        let (status, _, body) = send(&app, method, "/visitors", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "storage unavailable" }));
    }
}

#[tokio::test]
async fn content_views_round_trip() {
    let app = app(test_deployment().await);

    let (status, _, body) = send(&app, Method::GET, "/views/hello-rust", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "slug": "hello-rust", "count": 0 }));

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/views/hello-rust",
        Some(json!({ "type": "blog" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "slug": "hello-rust", "count": 1 }));

    // body is optional
    let (_, _, body) = send(&app, Method::POST, "/views/hello-rust", None).await;
    assert_eq!(body["count"], 2);

    send(&app, Method::POST, "/views/ray-tracer", Some(json!({ "type": "project" }))).await;

    let (status, _, body) = send(&app, Method::GET, "/views?type=blog", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["slug"], "hello-rust");
    assert_eq!(listed[0]["type"], "blog");
    assert_eq!(listed[0]["views"], 2);

    let (_, _, body) = send(&app, Method::GET, "/views?type=project", None).await;
    assert_eq!(body.as_array().unwrap()[0]["slug"], "ray-tracer");
}

#[tokio::test]
async fn content_views_rejects_bad_input() {
    let app = app(test_deployment().await);

    let (status, _, body) = send(&app, Method::GET, "/views/bad.slug", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid slug"));

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/views/fine-slug",
        Some(json!({ "type": "guestbook" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, Method::GET, "/views?type=comment", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "unknown content type: comment" }));

    // nothing was written by the rejected POST
    let (_, _, body) = send(&app, Method::GET, "/views/fine-slug", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn health_reports_migrations() {
    let app = app(test_deployment().await);

    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["migrations_applied"].as_u64().unwrap() >= 1);
}
