//! Service configuration.
//!
//! This module provides [`RenderServiceConfig`] and
//! [`RenderServiceConfigBuilder`]. The configuration is built once at
//! process start and handed to [`RenderService`](crate::RenderService); the
//! pipeline never reads the environment on its own.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_render::RenderServiceConfigBuilder;
//! use html2pdf_render::request::DeliveryMode;
//!
//! let config = RenderServiceConfigBuilder::new()
//!     .delivery_mode(DeliveryMode::Upload)
//!     .bucket("rendered-pdfs")
//!     .shared_secret("s3cret")
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(
//!     config.public_domain().as_deref(),
//!     Some("rendered-pdfs.s3.amazonaws.com")
//! );
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, the configuration can be loaded
//! from environment variables and an optional `app.env` file:
//!
//! ```rust,ignore
//! use html2pdf_render::config::env::from_env;
//!
//! let config = from_env()?;
//! ```
//!
//! See [`mod@env`] module for available environment variables.

use std::time::Duration;

use crate::browser::{DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_VIEWPORT};
use crate::request::{DeliveryMode, Viewport};

/// Default overall deadline for launch, load and render, in seconds.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 60;

/// Immutable deployment configuration.
///
/// # Fields Overview
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `shared_secret` | none | Enables the access guard |
/// | `delivery_mode` | inline | Inline base64 or upload |
/// | `bucket` | none | Target bucket (required for upload) |
/// | `public_domain` | `<bucket>.s3.amazonaws.com` | Host for returned URLs |
/// | `chrome_path` | auto | Chrome binary |
/// | `default_viewport` | 1920x1080 | Window size at launch |
/// | `navigation_timeout` | 30s | Per-operation CDP timeout |
/// | `render_timeout` | 60s | Launch + load + render deadline |
#[derive(Clone)]
pub struct RenderServiceConfig {
    /// Shared secret the `Authorization` header must end with.
    pub shared_secret: Option<String>,

    pub delivery_mode: DeliveryMode,

    /// Bucket uploaded artifacts are written to.
    pub bucket: Option<String>,

    /// Host used to build public URLs for uploaded objects.
    ///
    /// Falls back to the bucket's virtual-hosted S3 domain.
    pub public_domain: Option<String>,

    /// Custom Chrome/Chromium binary. `None` auto-detects.
    pub chrome_path: Option<String>,

    /// Viewport the browser starts with when the request sets none.
    pub default_viewport: Viewport,

    /// Default timeout for every page operation (navigation, print, capture).
    pub navigation_timeout: Duration,

    /// Overall deadline for launch, content loading and rendering.
    ///
    /// # Considerations
    ///
    /// - Keep it below the function runtime's own timeout so the invocation
    ///   can still report a clean error
    /// - Upload time is not included
    pub render_timeout: Duration,
}

impl RenderServiceConfig {
    /// Host for public URLs: the configured domain, or the bucket's S3 host.
    pub fn public_domain(&self) -> Option<String> {
        self.public_domain.clone().or_else(|| {
            self.bucket
                .as_ref()
                .map(|bucket| format!("{}.s3.amazonaws.com", bucket))
        })
    }
}

impl Default for RenderServiceConfig {
    fn default() -> Self {
        Self {
            shared_secret: None,
            delivery_mode: DeliveryMode::Inline,
            bucket: None,
            public_domain: None,
            chrome_path: None,
            default_viewport: DEFAULT_VIEWPORT,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for RenderServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderServiceConfig")
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .field("delivery_mode", &self.delivery_mode)
            .field("bucket", &self.bucket)
            .field("public_domain", &self.public_domain)
            .field("chrome_path", &self.chrome_path)
            .field("default_viewport", &self.default_viewport)
            .field("navigation_timeout", &self.navigation_timeout)
            .field("render_timeout", &self.render_timeout)
            .finish()
    }
}

/// Builder for [`RenderServiceConfig`] with validation.
///
/// # Validation
///
/// The [`build()`](Self::build) method validates:
/// - upload delivery requires a bucket
/// - timeouts must be non-zero
/// - the default viewport must be non-empty
pub struct RenderServiceConfigBuilder {
    config: RenderServiceConfig,
}

impl RenderServiceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RenderServiceConfig::default(),
        }
    }

    /// Enable the access guard. Empty strings leave it disabled.
    pub fn shared_secret<S: Into<String>>(mut self, secret: S) -> Self {
        let secret = secret.into();
        self.config.shared_secret = (!secret.is_empty()).then_some(secret);
        self
    }

    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.config.delivery_mode = mode;
        self
    }

    pub fn bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.config.bucket = Some(bucket.into());
        self
    }

    pub fn public_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.config.public_domain = Some(domain.into());
        self
    }

    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn default_viewport(mut self, width: u32, height: u32) -> Self {
        self.config.default_viewport = Viewport { width, height };
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.navigation_timeout = timeout;
        self
    }

    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.config.render_timeout = timeout;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - Returns error if upload delivery has no bucket
    /// - Returns error if a timeout is zero
    /// - Returns error if the default viewport has a zero side
    pub fn build(self) -> std::result::Result<RenderServiceConfig, String> {
        let config = self.config;

        if config.delivery_mode == DeliveryMode::Upload
            && config.bucket.as_deref().is_none_or(str::is_empty)
        {
            return Err("upload delivery requires a bucket".to_string());
        }

        if config.navigation_timeout.is_zero() {
            return Err("navigation_timeout must be greater than 0".to_string());
        }

        if config.render_timeout.is_zero() {
            return Err("render_timeout must be greater than 0".to_string());
        }

        if config.default_viewport.width == 0 || config.default_viewport.height == 0 {
            return Err("default_viewport must be non-empty".to_string());
        }

        Ok(config)
    }
}

impl Default for RenderServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// This module is only available when the `env-config` feature is enabled.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `HTML_TO_PDF_SERVICE_TOKEN` | String | unset | Shared secret; enables the guard |
/// | `PDF_BUCKET_NAME` | String | unset | Upload bucket |
/// | `PUBLIC_DOMAIN` | String | `<bucket>.s3.amazonaws.com` | Host for returned URLs |
/// | `DELIVERY_MODE` | `inline`/`upload` | `upload` if a bucket is set | Delivery mode |
/// | `CHROME_PATH` | String | auto | Chrome binary |
/// | `NAVIGATION_TIMEOUT_SECONDS` | u64 | 30 | Per-operation CDP timeout |
/// | `RENDER_TIMEOUT_SECONDS` | u64 | 60 | Launch + load + render deadline |
///
/// Empty values count as unset.
///
/// # Example `app.env` File
///
/// ```text
/// HTML_TO_PDF_SERVICE_TOKEN=change-me
/// PDF_BUCKET_NAME=rendered-pdfs
/// DELIVERY_MODE=upload
/// RENDER_TIMEOUT_SECONDS=45
/// ```
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::RenderServiceError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load environment variables from `app.env`.
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    /// Load configuration from the process environment (and `app.env`, if
    /// present).
    ///
    /// # Errors
    ///
    /// Returns [`RenderServiceError::Configuration`] for an unknown
    /// `DELIVERY_MODE` or a configuration that fails validation.
    pub fn from_env() -> Result<RenderServiceConfig, RenderServiceError> {
        match load_env_file() {
            Ok(path) => {
                log::info!("📄 Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// [`from_env`] is this function over `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<RenderServiceConfig, RenderServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let seconds = |key: &str, default: u64| {
            get(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let shared_secret = get("HTML_TO_PDF_SERVICE_TOKEN");
        let bucket = get("PDF_BUCKET_NAME");

        let delivery_mode = match get("DELIVERY_MODE") {
            Some(mode) => mode.parse::<DeliveryMode>()?,
            None if bucket.is_some() => DeliveryMode::Upload,
            None => DeliveryMode::Inline,
        };

        let navigation_timeout_seconds = seconds(
            "NAVIGATION_TIMEOUT_SECONDS",
            DEFAULT_NAVIGATION_TIMEOUT.as_secs(),
        );
        let render_timeout_seconds = seconds("RENDER_TIMEOUT_SECONDS", DEFAULT_RENDER_TIMEOUT_SECS);

        log::info!("🔧 Loading render configuration from environment:");
        log::info!("   - Delivery mode: {}", delivery_mode);
        log::info!("   - Access guard: {}", if shared_secret.is_some() { "enabled" } else { "disabled" });
        log::info!("   - Bucket: {}", bucket.as_deref().unwrap_or("<none>"));
        log::info!("   - Navigation timeout: {}s", navigation_timeout_seconds);
        log::info!("   - Render timeout: {}s", render_timeout_seconds);

        let mut builder = RenderServiceConfigBuilder::new()
            .delivery_mode(delivery_mode)
            .navigation_timeout(Duration::from_secs(navigation_timeout_seconds))
            .render_timeout(Duration::from_secs(render_timeout_seconds));

        if let Some(secret) = shared_secret {
            builder = builder.shared_secret(secret);
        }
        if let Some(bucket) = bucket {
            builder = builder.bucket(bucket);
        }
        if let Some(domain) = get("PUBLIC_DOMAIN") {
            builder = builder.public_domain(domain);
        }
        if let Some(path) = get("CHROME_PATH") {
            builder = builder.chrome_path(path);
        }

        builder.build().map_err(RenderServiceError::Configuration)
    }

}

// ============================================================================
// Unit Tests
// ============================================================================
