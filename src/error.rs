//! Error types for the render pipeline.
//!
//! This module provides [`RenderServiceError`], a unified error type for every
//! stage of an invocation, and a convenient [`Result`] type alias.
//!
//! # Taxonomy
//!
//! | Stage | Variants | Raised |
//! |-------|----------|--------|
//! | Access guard | `Authorization` | before any browser is launched |
//! | Request normalizer | `MissingSource`, `ConflictingSource`, `MissingFileName`, `InvalidUrl`, `InvalidRequest` | before any browser is launched |
//! | Session manager | `BrowserLaunch` | after validation |
//! | Content loader | `ContentLoad` | session live, torn down before propagation |
//! | Artifact renderer | `Render` | session live, torn down before propagation |
//! | Delivery adapter | `Delivery` | session already released |
//! | Pipeline | `Timeout`, `Configuration` | anywhere |
//!
//! Nothing in this crate retries on any of these. [`is_retryable()`] is only
//! a hint for the caller.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_render::{RenderServiceError, Result};
//!
//! fn validate(html: Option<&str>) -> Result<&str> {
//!     html.ok_or(RenderServiceError::MissingSource)
//! }
//!
//! match validate(None) {
//!     Ok(html) => println!("Rendering {} bytes", html.len()),
//!     Err(e) => assert_eq!(e.status_code(), 400),
//! }
//! ```
//!
//! [`is_retryable()`]: RenderServiceError::is_retryable

/// Errors that can occur while handling a render invocation.
#[derive(Debug, thiserror::Error)]
pub enum RenderServiceError {
    /// The configured shared secret was not presented.
    ///
    /// The service turns this into a 403 response rather than returning it
    /// as an error; it exists so transports can map it uniformly.
    #[error("Authorization required")]
    Authorization,

    /// Neither `html` nor `url` was supplied.
    #[error("html or url is a required parameter")]
    MissingSource,

    /// Both `html` and `url` were supplied.
    #[error("html and url are mutually exclusive")]
    ConflictingSource,

    /// Upload delivery is configured but the request has no `fileName`.
    #[error("fileName is a required parameter")]
    MissingFileName,

    /// The `url` source could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The envelope body or one of its option tokens could not be decoded.
    ///
    /// # Common Causes
    ///
    /// - `body` is not valid JSON
    /// - Unknown page `format` token
    /// - Margin length with an unsupported unit
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Chrome could not be launched or its page could not be opened.
    ///
    /// # Common Causes
    ///
    /// - Chrome/Chromium binary not found or not executable
    /// - Invalid launch flags
    /// - Sandbox or resource limits in the execution environment
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// The page never reached the navigation-settled barrier.
    #[error("Failed to load content: {0}")]
    ContentLoad(String),

    /// PDF printing or screenshot capture failed.
    #[error("Failed to render artifact: {0}")]
    Render(String),

    /// The artifact could not be written to object storage.
    #[error("Failed to deliver artifact: {0}")]
    Delivery(String),

    /// Launch, load and render did not finish within the render deadline.
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Invalid service configuration.
    ///
    /// # Common Causes
    ///
    /// - Upload delivery selected without a bucket
    /// - Zero-length timeouts
    /// - Unknown `DELIVERY_MODE` value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RenderServiceError {
    /// HTTP-equivalent status code for this error.
    ///
    /// ```rust
    /// use html2pdf_render::RenderServiceError;
    ///
    /// assert_eq!(RenderServiceError::MissingSource.status_code(), 400);
    /// assert_eq!(RenderServiceError::Authorization.status_code(), 403);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            // Client errors (4xx)
            Self::MissingSource
            | Self::ConflictingSource
            | Self::MissingFileName
            | Self::InvalidUrl(_)
            | Self::InvalidRequest(_) => 400,
            Self::Authorization => 403,

            // Upstream errors
            Self::ContentLoad(_) | Self::Render(_) | Self::Delivery(_) => 502,

            // Browser could not be started
            Self::BrowserLaunch(_) => 503,

            Self::Timeout(_) => 504,

            Self::Configuration(_) => 500,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Authorization => "AUTHORIZATION_REQUIRED",
            Self::MissingSource => "MISSING_SOURCE",
            Self::ConflictingSource => "CONFLICTING_SOURCE",
            Self::MissingFileName => "MISSING_FILE_NAME",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BrowserLaunch(_) => "BROWSER_LAUNCH_FAILED",
            Self::ContentLoad(_) => "CONTENT_LOAD_FAILED",
            Self::Render(_) => "RENDER_FAILED",
            Self::Delivery(_) => "DELIVERY_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether a caller could reasonably retry the same request.
    ///
    /// Input and authorization failures are terminal; infrastructure failures
    /// may succeed on a fresh invocation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BrowserLaunch(_)
            | Self::ContentLoad(_)
            | Self::Render(_)
            | Self::Delivery(_)
            | Self::Timeout(_) => true,

            Self::Authorization
            | Self::MissingSource
            | Self::ConflictingSource
            | Self::MissingFileName
            | Self::InvalidUrl(_)
            | Self::InvalidRequest(_)
            | Self::Configuration(_) => false,
        }
    }

    /// True for errors raised before any browser resource is acquired.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Convenience conversion from [`String`] to [`RenderServiceError::Configuration`].
impl From<String> for RenderServiceError {
    fn from(msg: String) -> Self {
        RenderServiceError::Configuration(msg)
    }
}

/// Convenience conversion from `&str` to [`RenderServiceError::Configuration`].
impl From<&str> for RenderServiceError {
    fn from(msg: &str) -> Self {
        RenderServiceError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`RenderServiceError`].
pub type Result<T> = std::result::Result<T, RenderServiceError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let error: RenderServiceError = "test error".into();
        match error {
            RenderServiceError::Configuration(msg) => {
                assert_eq!(msg, "test error", "Error message should be preserved");
            }
            _ => panic!("Expected Configuration error variant"),
        }

        let error: RenderServiceError = "another error".to_string().into();
        assert!(matches!(error, RenderServiceError::Configuration(_)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RenderServiceError::MissingSource.to_string(),
            "html or url is a required parameter"
        );
        assert_eq!(
            RenderServiceError::MissingFileName.to_string(),
            "fileName is a required parameter"
        );
        assert_eq!(
            RenderServiceError::BrowserLaunch("chrome not found".to_string()).to_string(),
            "Failed to launch browser: chrome not found"
        );
        assert_eq!(
            RenderServiceError::Delivery("access denied".to_string()).to_string(),
            "Failed to deliver artifact: access denied"
        );
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(RenderServiceError::MissingSource.status_code(), 400);
        assert_eq!(RenderServiceError::MissingFileName.status_code(), 400);
        assert_eq!(RenderServiceError::Authorization.status_code(), 403);
        assert_eq!(
            RenderServiceError::ContentLoad(String::new()).status_code(),
            502
        );
        assert_eq!(
            RenderServiceError::BrowserLaunch(String::new()).status_code(),
            503
        );
        assert_eq!(RenderServiceError::Timeout(String::new()).status_code(), 504);
        assert_eq!(
            RenderServiceError::Configuration(String::new()).status_code(),
            500
        );
    }

    #[test]
    fn test_error_retryable() {
        assert!(RenderServiceError::BrowserLaunch(String::new()).is_retryable());
        assert!(RenderServiceError::Delivery(String::new()).is_retryable());
        assert!(!RenderServiceError::MissingSource.is_retryable());
        assert!(!RenderServiceError::Authorization.is_retryable());
    }

    #[test]
    fn test_client_errors() {
        assert!(RenderServiceError::MissingSource.is_client_error());
        assert!(RenderServiceError::InvalidUrl(String::new()).is_client_error());
        assert!(!RenderServiceError::Render(String::new()).is_client_error());
    }

    /// Verifies that RenderServiceError is Send + Sync for use across tasks.
    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
        assert_send_sync::<RenderServiceError>();
    }
}
