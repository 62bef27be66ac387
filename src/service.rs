//! The render pipeline.
//!
//! [`RenderService`] runs one invocation end to end:
//!
//! ```text
//! ┌──────────┐   ┌───────┐   ┌────────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │ Envelope │──►│ Guard │──►│ Normalizer │──►│ spawn_blocking + timeout     │──►│ Delivery │
//! └──────────┘   └───┬───┘   └─────┬──────┘   │ acquire ► load ► render ►    │   └────┬─────┘
//!                    │             │          │ release                      │        │
//!                  403        400 (no browser)└──────────────────────────────┘     200 │ 502
//! ```
//!
//! Validation, authorization and the delivery destination are resolved
//! before any browser is launched. Once a session exists it is owned by a
//! [`BrowserSession`] guard, so every exit from the blocking stage (success,
//! error or panic) closes the browser exactly once. When the render deadline
//! expires, the async side closes the browser through a [`TeardownHandle`]
//! before the timeout is reported. The session is released before the
//! upload starts.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_render::prelude::*;
//! use serde_json::json;
//!
//! let service = RenderService::builder()
//!     .config(RenderServiceConfig::default())
//!     .launcher(ChromeLauncher::with_defaults())
//!     .build()?;
//!
//! let response = service
//!     .handle_event(json!({ "html": "<h1>Hello</h1>" }))
//!     .await?;
//! assert_eq!(response.status_code, 200);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::BrowserLauncher;
use crate::config::RenderServiceConfig;
use crate::delivery::{self, DeliveryResult, Destination, ObjectStore};
use crate::error::{RenderServiceError, Result};
use crate::guard::AccessGuard;
use crate::render::{self, RenderedArtifact};
use crate::request::{DeliveryMode, Envelope, RenderRequest};
use crate::session::{BrowserSession, TeardownHandle};

/// Body of the 403 response.
pub const FORBIDDEN_BODY: &str = "Authorization Required.";

// ============================================================================
// Response Types
// ============================================================================

/// Gateway-shaped response.
///
/// Serialized in camelCase:
///
/// ```json
/// {
///   "statusCode": 200,
///   "headers": { "Content-Type": "application/json" },
///   "body": "{\"data\":\"JVBERi0xLjcK...\"}",
///   "isBase64Encoded": false
/// }
/// ```
///
/// `isBase64Encoded` is always `false`: inline artifacts are carried as base64
/// text inside the JSON body, not as a transport encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    fn with_body(status_code: u16, body: String, content_type: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    /// 200 with the delivery result as the JSON body.
    pub fn ok(result: &DeliveryResult) -> Self {
        let body = serde_json::to_string(&result.to_body())
            .unwrap_or_else(|_| String::from("{}"));
        Self::with_body(200, body, "application/json")
    }

    /// 403 with a low-detail plain-text body.
    pub fn forbidden() -> Self {
        Self::with_body(403, FORBIDDEN_BODY.to_string(), "text/plain")
    }

    /// Shape an error for transports that want a response instead of `Err`.
    pub fn from_error(error: &RenderServiceError) -> Self {
        if matches!(error, RenderServiceError::Authorization) {
            return Self::forbidden();
        }
        let body = serde_json::to_string(&ErrorResponse::from(error))
            .unwrap_or_else(|_| String::from("{}"));
        Self::with_body(error.status_code(), body, "application/json")
    }
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&RenderServiceError> for ErrorResponse {
    fn from(err: &RenderServiceError) -> Self {
        Self {
            error: err.to_string(),
            code: err.error_code().to_string(),
        }
    }
}

impl From<RenderServiceError> for ErrorResponse {
    fn from(err: RenderServiceError) -> Self {
        Self::from(&err)
    }
}

/// Health check body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

// ============================================================================
// RenderService
// ============================================================================

/// One configured render pipeline, shared by every invocation in a process.
///
/// Holds no per-invocation state; every call to
/// [`handle_event`](Self::handle_event) launches and tears down its own
/// browser.
pub struct RenderService {
    config: Arc<RenderServiceConfig>,
    guard: AccessGuard,
    launcher: Arc<dyn BrowserLauncher>,
    store: Option<Arc<dyn ObjectStore>>,

    /// Resolved once from the config.
    public_domain: Option<String>,
}

impl RenderService {
    pub fn builder() -> RenderServiceBuilder {
        RenderServiceBuilder::new()
    }

    pub fn config(&self) -> &RenderServiceConfig {
        &self.config
    }

    /// Handle one raw invocation event.
    ///
    /// Returns `Ok` with a 200 response on success and a 403 response when
    /// the access guard rejects the caller. Every other failure is returned
    /// as `Err` for the transport to translate (see
    /// [`GatewayResponse::from_error`]).
    pub async fn handle_event(&self, event: Value) -> Result<GatewayResponse> {
        self.handle_envelope(Envelope::from_value(event)).await
    }

    /// Same as [`handle_event`](Self::handle_event) for an already-split envelope.
    pub async fn handle_envelope(&self, envelope: Envelope) -> Result<GatewayResponse> {
        match self.process(envelope).await {
            Ok(result) => Ok(GatewayResponse::ok(&result)),
            Err(RenderServiceError::Authorization) => Ok(GatewayResponse::forbidden()),
            Err(e) => Err(e),
        }
    }

    /// Run the pipeline and return the delivery result.
    ///
    /// # Errors
    ///
    /// Any [`RenderServiceError`], including `Authorization`.
    pub async fn process(&self, envelope: Envelope) -> Result<DeliveryResult> {
        let start = Instant::now();

        self.guard.check(&envelope)?;

        let payload = envelope.payload().inspect_err(|e| {
            log::warn!("⚠️ Rejected malformed request: {}", e);
        })?;
        let request = RenderRequest::from_payload(payload, self.config.delivery_mode)
            .inspect_err(|e| {
                log::warn!("⚠️ Rejected invalid request: {}", e);
            })?;

        log::debug!(
            "Processing {:?} request ({} delivery)",
            request.render_mode(),
            request.delivery_mode()
        );

        let destination = self.destination().inspect_err(|e| {
            log::error!("❌ {}", e);
        })?;
        let file_name = request.file_name().map(str::to_string);
        let artifact = self.render(request).await?;

        let result = delivery::deliver(destination, file_name.as_deref(), artifact).await?;

        log::info!("✅ Render completed in {:?}", start.elapsed());
        Ok(result)
    }

    fn destination(&self) -> Result<Destination<'_>> {
        match self.config.delivery_mode {
            DeliveryMode::Inline => Ok(Destination::Inline),
            DeliveryMode::Upload => {
                let store = self.store.as_deref().ok_or_else(|| {
                    RenderServiceError::Configuration("no object store configured".to_string())
                })?;
                let bucket = self.config.bucket.as_deref().ok_or_else(|| {
                    RenderServiceError::Configuration("no bucket configured".to_string())
                })?;
                let public_domain = self.public_domain.as_deref().ok_or_else(|| {
                    RenderServiceError::Configuration("no public domain configured".to_string())
                })?;
                Ok(Destination::Bucket {
                    store,
                    bucket,
                    public_domain,
                })
            }
        }
    }

    /// Launch, load and render on a blocking thread, bounded by the render
    /// deadline.
    ///
    /// On timeout the browser is closed before `Timeout` is returned: through
    /// the session's teardown handle if the page is up, otherwise by waiting
    /// for the launch to finish, at which point the task sees the
    /// cancellation and releases its session itself.
    async fn render(&self, request: RenderRequest) -> Result<RenderedArtifact> {
        let launcher = Arc::clone(&self.launcher);
        let deadline = self.config.render_timeout;
        let control = Arc::new(Mutex::new(RenderControl::default()));

        let mut task = {
            let control = Arc::clone(&control);
            tokio::task::spawn_blocking(move || {
                render_in_session(launcher.as_ref(), &request, &control)
            })
        };

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                log::error!("❌ Render task failed: {}", join_error);
                Err(RenderServiceError::Render(format!(
                    "render task failed: {}",
                    join_error
                )))
            }
            Err(_) => {
                log::error!("❌ Render exceeded deadline of {:?}", deadline);

                let handle = {
                    let mut control = control.lock().unwrap_or_else(PoisonError::into_inner);
                    control.cancelled = true;
                    control.teardown.take()
                };

                match handle {
                    // Closing can block on CDP, keep it off the async workers
                    Some(handle) => {
                        if let Err(e) = tokio::task::spawn_blocking(move || handle.teardown()).await
                        {
                            log::warn!("⚠️ Browser teardown task failed: {}", e);
                        }
                    }
                    None => {
                        if let Err(e) = task.await {
                            log::warn!("⚠️ Render task failed after timeout: {}", e);
                        }
                    }
                }

                Err(RenderServiceError::Timeout(format!(
                    "render did not finish within {:?}",
                    deadline
                )))
            }
        }
    }
}

impl std::fmt::Debug for RenderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderService")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

/// Shared between the blocking render task and the caller enforcing its
/// deadline.
#[derive(Debug, Default)]
struct RenderControl {
    /// Set once the deadline has passed.
    cancelled: bool,

    /// Published by the task as soon as its browser is up.
    teardown: Option<TeardownHandle>,
}

/// Blocking stage: acquire, load, render, release.
///
/// Any early return drops `session`, which closes the browser.
fn render_in_session(
    launcher: &dyn BrowserLauncher,
    request: &RenderRequest,
    control: &Mutex<RenderControl>,
) -> Result<RenderedArtifact> {
    let mut session = BrowserSession::acquire(launcher).inspect_err(|e| {
        log::error!("❌ {}", e);
    })?;

    {
        let mut control = control.lock().unwrap_or_else(PoisonError::into_inner);
        if control.cancelled {
            log::debug!(
                "Session {} launched after the deadline, closing",
                session.id()
            );
            session.release();
            return Err(RenderServiceError::Timeout(
                "render cancelled during launch".to_string(),
            ));
        }
        control.teardown = session.teardown_handle();
    }

    let page = session.page().ok_or_else(|| {
        RenderServiceError::Render("browser session already released".to_string())
    })?;

    render::load_content(page, request).inspect_err(|e| {
        log::error!("❌ Session {}: {}", session.id(), e);
    })?;
    let artifact = render::render_artifact(page, request).inspect_err(|e| {
        log::error!("❌ Session {}: {}", session.id(), e);
    })?;

    session.release();
    Ok(artifact)
}

// ============================================================================
// RenderServiceBuilder
// ============================================================================

/// Builder for [`RenderService`].
///
/// # Validation
///
/// - a launcher is required
/// - upload delivery requires an object store
pub struct RenderServiceBuilder {
    config: Option<RenderServiceConfig>,
    launcher: Option<Arc<dyn BrowserLauncher>>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl RenderServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            launcher: None,
            store: None,
        }
    }

    /// Defaults to [`RenderServiceConfig::default`].
    pub fn config(mut self, config: RenderServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn launcher<L: BrowserLauncher + 'static>(mut self, launcher: L) -> Self {
        self.launcher = Some(Arc::new(launcher));
        self
    }

    pub fn store<S: ObjectStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// # Errors
    ///
    /// Returns [`RenderServiceError::Configuration`] if no launcher was set,
    /// or if upload delivery is configured without a store.
    pub fn build(self) -> Result<RenderService> {
        let config = self.config.unwrap_or_default();
        let launcher = self
            .launcher
            .ok_or_else(|| RenderServiceError::Configuration("No launcher provided".to_string()))?;

        if config.delivery_mode == DeliveryMode::Upload && self.store.is_none() {
            return Err(RenderServiceError::Configuration(
                "upload delivery requires an object store".to_string(),
            ));
        }

        log::info!(
            "🚀 Render service ready ({} delivery, guard {})",
            config.delivery_mode,
            if config.shared_secret.is_some() { "enabled" } else { "disabled" }
        );

        Ok(RenderService {
            guard: AccessGuard::new(config.shared_secret.clone()),
            public_domain: config.public_domain(),
            config: Arc::new(config),
            launcher,
            store: self.store,
        })
    }
}

impl Default for RenderServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
