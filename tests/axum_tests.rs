//! HTTP surface tests for the Axum router.

#![cfg(feature = "axum-integration")]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use html2pdf_render::browser::mock::MockLauncher;
use html2pdf_render::integrations::axum::router;
use html2pdf_render::prelude::*;
use html2pdf_render::service::FORBIDDEN_BODY;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(secret: Option<&str>) -> axum::Router {
    let mut builder = RenderServiceConfigBuilder::new();
    if let Some(secret) = secret {
        builder = builder.shared_secret(secret);
    }
    let service = RenderService::builder()
        .config(builder.build().unwrap())
        .launcher(MockLauncher::new())
        .build()
        .unwrap();
    router(Arc::new(service))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_render_inline_pdf() {
    let response = app(None)
        .oneshot(
            Request::post("/render")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"html":"<h1>Hello</h1>"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body = body_json(response).await;
    assert!(body["data"].as_str().unwrap().starts_with("JVBERi0")); // "%PDF-"
}

#[tokio::test]
async fn test_render_missing_source_is_400() {
    let response = app(None)
        .oneshot(
            Request::post("/render")
                .body(Body::from(r#"{"fileName":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_SOURCE");
}

#[tokio::test]
async fn test_render_requires_secret() {
    let app = app(Some("s3cret"));

    let rejected = app
        .clone()
        .oneshot(
            Request::post("/render")
                .body(Body::from(r#"{"html":"<p/>"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
    assert_eq!(rejected.headers().get("content-type").unwrap(), "text/plain");
    let bytes = to_bytes(rejected.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], FORBIDDEN_BODY.as_bytes());

    let accepted = app
        .oneshot(
            Request::post("/render")
                .header("authorization", "Bearer s3cret")
                .body(Body::from(r#"{"html":"<p/>"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
}
