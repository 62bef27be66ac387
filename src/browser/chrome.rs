//! Chrome/Chromium launcher.
//!
//! [`ChromeLauncher`] starts a fresh headless Chrome per invocation with a
//! hardened argument set meant for locked-down function sandboxes.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_render::browser::{BrowserLauncher, ChromeLauncher};
//!
//! // Auto-detect Chrome installation
//! let launcher = ChromeLauncher::with_defaults();
//!
//! // Or specify custom path
//! let launcher = ChromeLauncher::with_path("/opt/chromium/chrome".to_string());
//!
//! let page = launcher.launch()?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::{Bounds, PrintToPdfOptions};
use headless_chrome::util::Wait;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::{BrowserLauncher, PageDriver};
use crate::config::RenderServiceConfig;
use crate::error::{RenderServiceError, Result};
use crate::request::Viewport;

/// Viewport used when the request does not set one.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

/// Default per-operation CDP timeout (navigation, printing, capture).
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Launches Chrome/Chromium browsers.
///
/// Holds a function producing [`LaunchOptions`] so each launch gets a fresh
/// set of options.
pub struct ChromeLauncher {
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,

    /// Applied to every page as its default CDP wait timeout.
    navigation_timeout: Duration,
}

impl ChromeLauncher {
    /// Create a launcher with a custom launch options function.
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    /// Auto-detect the Chrome binary and use default viewport and timeouts.
    pub fn with_defaults() -> Self {
        log::debug!("Creating ChromeLauncher with auto-detect");
        Self::new(|| {
            create_chrome_options(None, DEFAULT_VIEWPORT, DEFAULT_NAVIGATION_TIMEOUT * 2)
                .map_err(|e| RenderServiceError::Configuration(e.to_string()))
        })
    }

    /// Use the Chrome binary at `chrome_path`.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!("Creating ChromeLauncher with custom path: {}", chrome_path);
        Self::new(move || {
            create_chrome_options(
                Some(&chrome_path),
                DEFAULT_VIEWPORT,
                DEFAULT_NAVIGATION_TIMEOUT * 2,
            )
            .map_err(|e| RenderServiceError::Configuration(e.to_string()))
        })
    }

    /// Build a launcher from service configuration (binary path, default
    /// viewport, navigation and render timeouts).
    pub fn from_config(config: &RenderServiceConfig) -> Self {
        let chrome_path = config.chrome_path.clone();
        let viewport = config.default_viewport;
        // The browser must outlive the longest render we are willing to wait for
        let idle_timeout = config.render_timeout;

        let mut launcher = Self::new(move || {
            create_chrome_options(chrome_path.as_deref(), viewport, idle_timeout)
                .map_err(|e| RenderServiceError::Configuration(e.to_string()))
        });
        launcher.navigation_timeout = config.navigation_timeout;
        launcher
    }

    /// Override the per-page CDP timeout.
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>> {
        log::trace!("ChromeLauncher::launch() called");

        let options = (self.launch_options_fn)()?;

        log::debug!("Starting browser...");
        let browser = Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            RenderServiceError::BrowserLaunch(e.to_string())
        })?;

        log::debug!("Opening page...");
        // On failure `browser` is dropped here, which kills the process
        let tab = browser.new_tab().map_err(|e| {
            log::error!("❌ Failed to open page: {}", e);
            RenderServiceError::BrowserLaunch(e.to_string())
        })?;
        tab.set_default_timeout(self.navigation_timeout);

        Ok(Box::new(ChromePage {
            browser: Mutex::new(Some(browser)),
            tab,
            load_timeout: self.navigation_timeout,
            closed: AtomicBool::new(false),
        }))
    }
}

/// A page in a browser this launcher owns.
struct ChromePage {
    /// Taken on close; dropping the last `Browser` handle kills the process.
    browser: Mutex<Option<Browser>>,
    tab: Arc<Tab>,
    load_timeout: Duration,
    closed: AtomicBool,
}

impl ChromePage {
    fn main_frame_id(&self) -> Result<String> {
        self.tab
            .call_method(Page::GetFrameTree(None))
            .map(|tree| tree.frame_tree.frame.id)
            .map_err(|e| {
                log::error!("❌ Failed to read frame tree: {}", e);
                RenderServiceError::ContentLoad(e.to_string())
            })
    }

    fn document_complete(&self) -> bool {
        self.tab
            .evaluate("document.readyState === 'complete'", false)
            .ok()
            .and_then(|result| result.value)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

impl PageDriver for ChromePage {
    fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        log::trace!("Setting viewport to {}x{}", viewport.width, viewport.height);
        self.tab
            .set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(f64::from(viewport.width)),
                height: Some(f64::from(viewport.height)),
            })
            .map(|_| ())
            .map_err(|e| {
                log::error!("❌ Failed to set viewport: {}", e);
                RenderServiceError::ContentLoad(format!("failed to set viewport: {}", e))
            })
    }

    fn navigate(&self, url: &str) -> Result<()> {
        // navigate_to flags the tab as navigating before sending Page.navigate
        self.tab.navigate_to(url).map(|_| ()).map_err(|e| {
            log::error!("❌ Failed to navigate: {}", e);
            RenderServiceError::ContentLoad(e.to_string())
        })
    }

    fn wait_until_navigated(&self) -> Result<()> {
        self.tab.wait_until_navigated().map(|_| ()).map_err(|e| {
            log::error!("❌ Navigation did not settle: {}", e);
            RenderServiceError::ContentLoad(format!("navigation timeout: {}", e))
        })
    }

    fn set_content(&self, html: &str) -> Result<()> {
        let frame_id = self.main_frame_id()?;

        self.tab
            .call_method(Page::SetDocumentContent {
                frame_id,
                html: html.to_string(),
            })
            .map_err(|e| {
                log::error!("❌ Failed to set document content: {}", e);
                RenderServiceError::ContentLoad(e.to_string())
            })?;

        // readyState is polled rather than awaited as an event, so a load that
        // finished before the first poll is still observed
        Wait::with_timeout(self.load_timeout)
            .until(|| self.document_complete().then_some(()))
            .map_err(|e| {
                log::error!("❌ Document did not finish loading: {}", e);
                RenderServiceError::ContentLoad(format!("load timeout: {}", e))
            })
    }

    fn print_to_pdf(&self, options: PrintToPdfOptions) -> Result<Vec<u8>> {
        self.tab.print_to_pdf(Some(options)).map_err(|e| {
            log::error!("❌ Failed to print PDF: {}", e);
            RenderServiceError::Render(e.to_string())
        })
    }

    fn capture_full_page_png(&self) -> Result<Vec<u8>> {
        let metrics = self
            .tab
            .call_method(Page::GetLayoutMetrics(None))
            .map_err(|e| {
                log::error!("❌ Failed to read layout metrics: {}", e);
                RenderServiceError::Render(e.to_string())
            })?;

        let content = metrics.content_size;
        log::trace!(
            "Capturing full page ({}x{} CSS px)",
            content.width,
            content.height
        );

        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: content.width.ceil(),
            height: content.height.ceil(),
            scale: 1.0,
        };

        // Tab::capture_screenshot leaves captureBeyondViewport unset, which
        // paints nothing below the first viewport
        let data = self
            .tab
            .call_method(Page::CaptureScreenshot {
                format: Some(Page::CaptureScreenshotFormatOption::Png),
                quality: None,
                clip: Some(clip),
                from_surface: Some(true),
                capture_beyond_viewport: Some(true),
                optimize_for_speed: None,
            })
            .map_err(|e| {
                log::error!("❌ Failed to capture screenshot: {}", e);
                RenderServiceError::Render(e.to_string())
            })?
            .data;

        BASE64.decode(data).map_err(|e| {
            log::error!("❌ Screenshot payload is not valid base64: {}", e);
            RenderServiceError::Render(e.to_string())
        })
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let result = self.tab.close(true).map(|_| ()).map_err(|e| {
            RenderServiceError::Render(format!("failed to close page: {}", e))
        });

        // Dropping the last Browser handle kills the Chrome process
        let browser = self
            .browser
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(browser);

        result
    }
}

/// Create hardened Chrome launch options.
///
/// # Parameters
///
/// * `chrome_path` - Custom Chrome binary path. If `None`, auto-detects.
/// * `viewport` - Initial window size.
/// * `idle_timeout` - How long the CDP connection may stay silent before
///   `headless_chrome` gives up on the browser.
///
/// # Chrome Flags Applied
///
/// ## Sandbox
/// - `--no-sandbox`, `--disable-setuid-sandbox`, `--no-zygote` - the
///   function runtime is already a locked-down sandbox without user namespaces
///
/// ## GPU and Rendering
/// - `--disable-gpu`, `--use-gl=swiftshader`, `--disable-dev-shm-usage`,
///   `--hide-scrollbars`
///
/// ## Telemetry and Background Traffic
/// - `--disable-breakpad`, `--disable-crash-reporter`, `--metrics-recording-only`,
///   `--no-pings`, `--disable-background-networking`, `--disable-component-update`,
///   `--disable-domain-reliability`, `--disable-sync`
///
/// ## Media
/// - `--autoplay-policy=user-gesture-required`, `--mute-audio`
///
/// ## Rendering Fidelity
/// - `--allow-running-insecure-content`, `--disable-web-security`,
///   `--disable-site-isolation-trials`,
///   `--disable-features=IsolateOrigins,site-per-process` - mixed content and
///   cross-origin assets (fonts, images) must load
pub fn create_chrome_options(
    chrome_path: Option<&str>,
    viewport: Viewport,
    idle_timeout: Duration,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    match chrome_path {
        Some(path) => log::debug!("Creating Chrome options with custom path: {}", path),
        None => log::debug!("Creating Chrome options (auto-detect browser)"),
    }

    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
    }

    builder
        .headless(true)
        .sandbox(false)
        .disable_default_args(true)
        .ignore_certificate_errors(true)
        .window_size(Some((viewport.width, viewport.height)))
        .idle_browser_timeout(idle_timeout)
        .args(vec![
            // ===== Sandbox (execution environment is already locked down) =====
            "--disable-setuid-sandbox".as_ref(),
            "--no-zygote".as_ref(),
            // ===== GPU and Rendering =====
            "--disable-gpu".as_ref(),
            "--use-gl=swiftshader".as_ref(),
            "--disable-dev-shm-usage".as_ref(),
            "--hide-scrollbars".as_ref(),
            // ===== Telemetry and Background Traffic =====
            "--disable-breakpad".as_ref(),
            "--disable-crash-reporter".as_ref(),
            "--metrics-recording-only".as_ref(),
            "--no-pings".as_ref(),
            "--disable-background-networking".as_ref(),
            "--disable-component-update".as_ref(),
            "--disable-domain-reliability".as_ref(),
            "--disable-client-side-phishing-detection".as_ref(),
            "--disable-sync".as_ref(),
            // ===== Media =====
            "--autoplay-policy=user-gesture-required".as_ref(),
            "--mute-audio".as_ref(),
            // ===== Rendering Fidelity =====
            "--allow-running-insecure-content".as_ref(),
            "--disable-web-security".as_ref(),
            "--disable-site-isolation-trials".as_ref(),
            "--disable-features=IsolateOrigins,site-per-process".as_ref(),
            // ===== Unneeded UI =====
            "--disable-extensions".as_ref(),
            "--disable-default-apps".as_ref(),
            "--disable-notifications".as_ref(),
            "--disable-print-preview".as_ref(),
            "--no-default-browser-check".as_ref(),
            "--no-first-run".as_ref(),
            "--password-store=basic".as_ref(),
            "--use-mock-keychain".as_ref(),
            // ===== CDP Stability =====
            "--disable-background-timer-throttling".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-hang-monitor".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!(
                "❌ Failed to build Chrome launch options (path: {}): {}",
                path_msg,
                e
            );
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================
