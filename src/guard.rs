//! Shared-secret access guard.
//!
//! When the deployment configures a secret, every invocation must carry an
//! `Authorization` header (any casing) whose value ends with that secret,
//! e.g. `Bearer <secret>`. The guard only looks at headers, so it runs
//! before the payload is decoded and before any browser is launched.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_render::guard::AccessGuard;
//! use html2pdf_render::request::Envelope;
//! use serde_json::json;
//!
//! let guard = AccessGuard::new(Some("s3cret".to_string()));
//! let envelope = Envelope::from_value(json!({
//!     "headers": { "Authorization": "Bearer s3cret" }
//! }));
//!
//! assert!(guard.check(&envelope).is_ok());
//! ```

use crate::error::{RenderServiceError, Result};
use crate::request::Envelope;

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Optional shared-secret check.
#[derive(Clone, Default)]
pub struct AccessGuard {
    secret: Option<String>,
}

impl AccessGuard {
    /// Create a guard. An empty secret disables it.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// A guard that lets everything through.
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check the envelope's credential.
    ///
    /// # Errors
    ///
    /// Returns [`RenderServiceError::Authorization`] if a secret is configured
    /// and the header is missing or does not end with it.
    pub fn check(&self, envelope: &Envelope) -> Result<()> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        match envelope.header(AUTHORIZATION_HEADER) {
            Some(token) if token.ends_with(secret.as_str()) => {
                log::trace!("Authorization header accepted");
                Ok(())
            }
            Some(_) => {
                log::warn!("⛔ Rejected invocation: authorization header does not match");
                Err(RenderServiceError::Authorization)
            }
            None => {
                log::warn!("⛔ Rejected invocation: missing authorization header");
                Err(RenderServiceError::Authorization)
            }
        }
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_with(auth: Option<(&str, &str)>) -> Envelope {
        match auth {
            Some((name, value)) => {
                let mut headers = serde_json::Map::new();
                headers.insert(name.to_string(), json!(value));
                Envelope::from_value(json!({ "headers": headers }))
            }
            None => Envelope::from_value(json!({ "html": "<p/>" })),
        }
    }

    #[test]
    fn test_disabled_guard_allows_everything() {
        let guard = AccessGuard::disabled();
        assert!(!guard.is_enabled());
        assert!(guard.check(&envelope_with(None)).is_ok());
    }

    #[test]
    fn test_empty_secret_disables_guard() {
        let guard = AccessGuard::new(Some(String::new()));
        assert!(!guard.is_enabled());
    }

    #[test]
    fn test_bearer_prefix_accepted() {
        let guard = AccessGuard::new(Some("token123".to_string()));
        assert!(guard
            .check(&envelope_with(Some(("Authorization", "Bearer token123"))))
            .is_ok());
        assert!(guard
            .check(&envelope_with(Some(("authorization", "token123"))))
            .is_ok());
    }

    #[test]
    fn test_header_name_case_insensitive() {
        let guard = AccessGuard::new(Some("token123".to_string()));
        assert!(guard
            .check(&envelope_with(Some(("AUTHORIZATION", "Bearer token123"))))
            .is_ok());
    }

    #[test]
    fn test_missing_header_rejected() {
        let guard = AccessGuard::new(Some("token123".to_string()));
        assert!(matches!(
            guard.check(&envelope_with(None)),
            Err(RenderServiceError::Authorization)
        ));
    }

    #[test]
    fn test_wrong_suffix_rejected() {
        let guard = AccessGuard::new(Some("token123".to_string()));
        assert!(matches!(
            guard.check(&envelope_with(Some(("Authorization", "Bearer token123x")))),
            Err(RenderServiceError::Authorization)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let guard = AccessGuard::new(Some("token123".to_string()));
        let debug = format!("{:?}", guard);
        assert!(!debug.contains("token123"));
        assert!(debug.contains("enabled"));
    }
}
