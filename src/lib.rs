//! # html2pdf-render
//!
//! Single-invocation headless Chrome renderer: HTML markup or a URL in, a
//! PDF or a full-page PNG out, returned inline as base64 or uploaded to S3.
//!
//! Every invocation launches its own browser, drives one page to a
//! navigation-settled state, renders, and shuts the browser down on every
//! exit path. Nothing is pooled or shared between invocations.
//!
//! ## Features
//!
//! - **One pipeline**: access guard, request validation, content loading,
//!   rendering and delivery, parameterized by delivery mode and render mode
//! - **Validation before launch**: bad input never starts a browser
//! - **Guaranteed teardown**: an RAII [`BrowserSession`](session::BrowserSession)
//!   closes Chrome on success, error, panic and timeout
//! - **Inline or upload delivery**: base64 in the response, or a public S3
//!   object under a random prefix
//! - **Function runtime and HTTP surfaces**: a `lambda_runtime` binary and an
//!   optional Axum router
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   Function runtime event / HTTP request     │
//! └─────────────────┬───────────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │              RenderService                  │
//! │  Envelope ─► AccessGuard ─► RenderRequest   │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │ blocking task, bounded by render_timeout│ │
//! │ │ BrowserSession::acquire                 │ │
//! │ │   load_content ─► render_artifact       │ │
//! │ │ release (or drop)                       │ │
//! │ └─────────────────────────────────────────┘ │
//! │  deliver: inline base64 │ ObjectStore put   │
//! └─────────────────┬───────────────────────────┘
//!                   ▼
//!              GatewayResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use html2pdf_render::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderServiceConfigBuilder::new().build()?;
//!
//!     let service = RenderService::builder()
//!         .launcher(ChromeLauncher::from_config(&config))
//!         .config(config)
//!         .build()?;
//!
//!     let response = service
//!         .handle_event(json!({ "html": "<h1>Hello</h1>", "format": "Letter" }))
//!         .await?;
//!
//!     println!("{}", response.body); // {"data":"JVBERi0xLjQK..."}
//!     Ok(())
//! }
//! ```
//!
//! ## Request Payload
//!
//! | Field | Type | Default | Description |
//! |-------|------|---------|-------------|
//! | `html` | string | | Inline markup (exclusive with `url`) |
//! | `url` | string | | Page to load (exclusive with `html`) |
//! | `fileName` | string | | Object name, required for upload delivery |
//! | `format` | string | `A4` | `Letter`, `Legal`, `Tabloid`, `Ledger`, `A0`–`A6` |
//! | `printBackground` | bool | `false` | Print CSS backgrounds |
//! | `margin.{top,right,bottom,left}` | length | `1in` | `px`, `in`, `cm`, `mm` or a number (px) |
//! | `viewportWidth`, `viewportHeight` | int | 1920×1080 | Page viewport |
//! | `renderScreenshot` | bool | `false` | Full-page PNG instead of PDF |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Configuration from environment variables and `app.env` |
//! | `s3` | [`S3ObjectStore`](delivery::S3ObjectStore) upload backend |
//! | `lambda` | The `render-function` binary |
//! | `axum-integration` | Axum router |
//! | `test-utils` | Mock launcher and in-memory object store |
//!
//! ## Testing
//!
//! For testing without Chrome, enable the `test-utils` feature and use
//! [`MockLauncher`](browser::mock::MockLauncher):
//!
//! ```rust,ignore
//! use html2pdf_render::browser::mock::MockLauncher;
//!
//! let launcher = MockLauncher::failing_load("navigation timeout");
//! let stats = launcher.stats();
//! let service = RenderService::builder().launcher(launcher).build()?;
//!
//! assert!(service.handle_event(json!({ "html": "<p/>" })).await.is_err());
//! assert_eq!(stats.close_count(), 1);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod browser;
pub mod config;
pub mod delivery;
pub mod error;
pub mod guard;
pub mod prelude;
pub mod render;
pub mod request;
pub mod service;
pub mod session;

// ============================================================================
// Feature-gated modules
// ============================================================================

/// Web framework integrations.
///
/// Enable `axum-integration` to use them.
#[cfg(feature = "axum-integration")]
pub mod integrations;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

pub use browser::{BrowserLauncher, ChromeLauncher, PageDriver, create_chrome_options};
pub use config::{RenderServiceConfig, RenderServiceConfigBuilder};
pub use delivery::{DeliveryResult, ObjectStore};
pub use error::{RenderServiceError, Result};
pub use request::{DeliveryMode, RenderMode, RenderRequest};
pub use service::{GatewayResponse, RenderService, RenderServiceBuilder};
pub use session::{BrowserSession, TeardownHandle};

#[cfg(feature = "s3")]
pub use delivery::S3ObjectStore;

#[cfg(feature = "env-config")]
pub use config::env::from_env;
