//! Convenient imports for common usage patterns.
//!
//! ```rust,ignore
//! use html2pdf_render::prelude::*;
//! ```
//!
//! This imports:
//!
//! - [`RenderService`] and [`RenderServiceBuilder`] - the pipeline
//! - [`RenderServiceConfig`] and [`RenderServiceConfigBuilder`] - configuration
//! - [`RenderServiceError`] and [`Result`] - errors
//! - [`GatewayResponse`] - the response shape
//! - [`BrowserLauncher`] and [`ChromeLauncher`] - browser launching
//! - [`ObjectStore`] - upload backend trait
//! - [`DeliveryMode`] and [`RenderMode`]
//! - [`S3ObjectStore`] (with the `s3` feature)

pub use crate::browser::{BrowserLauncher, ChromeLauncher};
pub use crate::config::{RenderServiceConfig, RenderServiceConfigBuilder};
pub use crate::delivery::ObjectStore;
pub use crate::error::{RenderServiceError, Result};
pub use crate::request::{DeliveryMode, RenderMode};
pub use crate::service::{GatewayResponse, RenderService, RenderServiceBuilder};

#[cfg(feature = "s3")]
pub use crate::delivery::S3ObjectStore;
