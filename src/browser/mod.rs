//! Browser launchers and page drivers.
//!
//! This module provides the two seams between the render pipeline and the
//! headless browser:
//!
//! - [`BrowserLauncher`] starts one browser process and opens one page.
//! - [`PageDriver`] is the page inside it: viewport, navigation barrier,
//!   inline document loading, PDF printing, full-page capture, and teardown.
//!
//! # Available Launchers
//!
//! | Launcher | Description |
//! |----------|-------------|
//! | [`ChromeLauncher`] | Launches Chrome/Chromium via `headless_chrome` |
//! | [`mock::MockLauncher`] | For testing (feature-gated) |
//!
//! Sessions are never pooled: each invocation launches its own browser
//! through a launcher and wraps the resulting page in a
//! [`BrowserSession`](crate::session::BrowserSession), which guarantees
//! teardown.
//!
//! # Custom Launcher
//!
//! ```rust,ignore
//! use html2pdf_render::browser::{BrowserLauncher, PageDriver};
//! use html2pdf_render::Result;
//!
//! struct RemoteChromeLauncher {
//!     ws_url: String,
//! }
//!
//! impl BrowserLauncher for RemoteChromeLauncher {
//!     fn launch(&self) -> Result<Box<dyn PageDriver>> {
//!         // connect to an already-running browser instead of spawning one
//!         todo!()
//!     }
//! }
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{
    ChromeLauncher, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_VIEWPORT, create_chrome_options,
};

use headless_chrome::types::PrintToPdfOptions;

use crate::error::Result;
use crate::request::Viewport;

/// Starts a browser process and opens a single page in it.
///
/// # Thread Safety
///
/// Launchers are built once per process and shared by every invocation,
/// so they must be `Send + Sync`.
pub trait BrowserLauncher: Send + Sync {
    /// Launch a browser and open one page.
    ///
    /// # Errors
    ///
    /// Returns [`RenderServiceError::BrowserLaunch`](crate::RenderServiceError::BrowserLaunch)
    /// if the process cannot be started or the page cannot be opened. A
    /// partially started browser must be shut down before returning the error.
    fn launch(&self) -> Result<Box<dyn PageDriver>>;
}

/// One page in one live browser process.
///
/// All methods block the calling thread. Drivers are shared between the
/// thread running the render and the caller enforcing its deadline, so they
/// must be `Send + Sync`.
pub trait PageDriver: Send + Sync {
    /// Resize the page viewport, in CSS pixels.
    fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Start navigating to `url`.
    ///
    /// Implementations must mark the navigation as pending *before* issuing
    /// it, so that a following [`wait_until_navigated`](Self::wait_until_navigated)
    /// cannot miss a load that completes synchronously.
    fn navigate(&self, url: &str) -> Result<()>;

    /// Block until the pending navigation has settled.
    fn wait_until_navigated(&self) -> Result<()>;

    /// Replace the document of the current page with `html` and block until
    /// it, and every subresource it references, has finished loading.
    ///
    /// Unlike navigating to a `data:` URL, the markup is not subject to URL
    /// length limits.
    fn set_content(&self, html: &str) -> Result<()>;

    /// Print the loaded page to PDF.
    fn print_to_pdf(&self, options: PrintToPdfOptions) -> Result<Vec<u8>>;

    /// Capture the whole document (not just the viewport) as PNG.
    fn capture_full_page_png(&self) -> Result<Vec<u8>>;

    /// Close the page and shut the browser process down.
    ///
    /// Idempotent: only the first call tears anything down, later calls
    /// return `Ok(())`. May be called from another thread while a blocking
    /// call is in flight. Teardown must not wait for that call; the call
    /// itself is then free to fail.
    fn close(&self) -> Result<()>;
}
