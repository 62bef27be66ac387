//! Axum framework integration.
//!
//! This module exposes the render pipeline over HTTP.
//!
//! # Setup
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! html2pdf-render = { version = "0.1", features = ["axum-integration"] }
//! axum = "0.8"
//! ```
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/render` | Body is the render payload; headers carry `Authorization` |
//! | `GET` | `/health` | `{"status":"healthy","service":"html2pdf-render"}` |
//!
//! The `/render` response mirrors the gateway response: status code,
//! content type (`application/json`, or `text/plain` for the 403), and the
//! same body the function binary returns. Pipeline errors are shaped with
//! [`GatewayResponse::from_error`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use html2pdf_render::integrations::axum::router;
//! use html2pdf_render::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = html2pdf_render::config::env::from_env()?;
//!     let service = RenderService::builder()
//!         .launcher(ChromeLauncher::from_config(&config))
//!         .config(config)
//!         .build()?;
//!
//!     let app = router(Arc::new(service));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::request::Envelope;
use crate::service::{GatewayResponse, HealthResponse, RenderService};

/// Shared state type for the render routes.
pub type SharedRenderService = Arc<RenderService>;

/// Build a router with `POST /render` and `GET /health`.
pub fn router(service: SharedRenderService) -> Router {
    Router::new()
        .route("/render", post(render_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

/// Render handler.
///
/// Converts HTTP headers and the raw body into an [`Envelope`] and runs
/// the pipeline.
pub async fn render_handler(
    State(service): State<SharedRenderService>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let envelope = Envelope::from_parts(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
        Some(body),
    );

    match service.handle_envelope(envelope).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            log::debug!("Render request failed with {}: {}", e.status_code(), e);
            GatewayResponse::from_error(&e).into_response()
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, self.body).into_response();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                response.headers_mut().insert(name, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_response_into_response() {
        let response = GatewayResponse::forbidden().into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain"
        );
    }
}
