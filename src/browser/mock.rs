//! Mock browser launcher for testing.
//!
//! This module provides a [`BrowserLauncher`] that never starts Chrome. Its
//! pages return PDF- and PNG-signature bytes and can be told to fail at a
//! chosen stage, so pipeline sequencing and teardown can be verified
//! without a browser installed.
//!
//! # Feature Flag
//!
//! This module is only available when:
//! - The `test-utils` feature is enabled, OR
//! - During testing (`#[cfg(test)]`)
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_render::browser::mock::MockLauncher;
//!
//! let launcher = MockLauncher::failing_load("navigation timeout");
//! let stats = launcher.stats();
//!
//! // ... run a render through the service ...
//!
//! assert_eq!(stats.launch_count(), 1);
//! assert_eq!(stats.close_count(), 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use headless_chrome::types::PrintToPdfOptions;

use super::{BrowserLauncher, DEFAULT_VIEWPORT, PageDriver};
use crate::error::{RenderServiceError, Result};
use crate::request::Viewport;

/// Bytes returned by a successful mock PDF print.
pub const MOCK_PDF: &[u8] = b"%PDF-1.7\n% mock document\n%%EOF\n";

/// Stage at which mock pages fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockFailure {
    #[default]
    None,
    Launch(String),
    Load(String),
    Render(String),
    Close(String),
}

/// Shared counters and event log, readable after the launcher has been
/// moved into a service.
#[derive(Debug, Clone, Default)]
pub struct MockStats {
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    events: Arc<Mutex<Vec<String>>>,
}

impl MockStats {
    /// Number of launch attempts, successful or not.
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Number of page teardowns. Repeated closes of one page count once.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Page calls in the order they happened, e.g. `["viewport:800x600", "navigate:about:blank", "wait", "content:<p/>", "pdf:background=false", "close"]`.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Launcher whose pages never touch a real browser.
#[derive(Debug, Clone)]
pub struct MockLauncher {
    failure: MockFailure,

    /// Height of the simulated document, in CSS pixels.
    content_height: u32,

    /// How long the navigation barrier blocks.
    load_delay: Duration,

    /// How long `launch` blocks before returning a page.
    launch_delay: Duration,

    stats: MockStats,
}

impl MockLauncher {
    /// A launcher whose pages succeed at every stage.
    pub fn new() -> Self {
        Self {
            failure: MockFailure::None,
            content_height: 2400,
            load_delay: Duration::ZERO,
            launch_delay: Duration::ZERO,
            stats: MockStats::default(),
        }
    }

    /// Launch always fails with `message`.
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        Self::new().with_failure(MockFailure::Launch(message.into()))
    }

    /// Pages fail while waiting for navigation to settle.
    pub fn failing_load<S: Into<String>>(message: S) -> Self {
        Self::new().with_failure(MockFailure::Load(message.into()))
    }

    /// Pages fail while printing or capturing.
    pub fn failing_render<S: Into<String>>(message: S) -> Self {
        Self::new().with_failure(MockFailure::Render(message.into()))
    }

    /// Page teardown reports an error (the browser is still counted as closed).
    pub fn failing_close<S: Into<String>>(message: S) -> Self {
        Self::new().with_failure(MockFailure::Close(message.into()))
    }

    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        self.failure = failure;
        self
    }

    /// Set the simulated document height used for full-page captures.
    pub fn with_content_height(mut self, height: u32) -> Self {
        self.content_height = height;
        self
    }

    /// Block in `wait_until_navigated` for `delay`, to simulate a slow page.
    ///
    /// Closing the page from another thread cuts the wait short.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Block in `launch` for `delay`, to simulate a slow browser start.
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    /// Handle to the counters, for checking after the launcher is moved.
    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserLauncher for MockLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>> {
        let count = self.stats.launches.fetch_add(1, Ordering::SeqCst);

        if !self.launch_delay.is_zero() {
            std::thread::sleep(self.launch_delay);
        }

        if let MockFailure::Launch(message) = &self.failure {
            log::debug!("MockLauncher: Returning configured launch failure");
            return Err(RenderServiceError::BrowserLaunch(message.clone()));
        }

        log::debug!("MockLauncher: Launching mock page #{}", count + 1);
        self.stats.record("launch".to_string());

        Ok(Box::new(MockPage {
            failure: self.failure.clone(),
            content_height: self.content_height,
            load_delay: self.load_delay,
            viewport: Mutex::new(DEFAULT_VIEWPORT),
            closed: AtomicBool::new(false),
            stats: self.stats.clone(),
        }))
    }
}

struct MockPage {
    failure: MockFailure,
    content_height: u32,
    load_delay: Duration,
    viewport: Mutex<Viewport>,
    closed: AtomicBool,
    stats: MockStats,
}

impl MockPage {
    /// Sleep for the configured load delay, returning early once closed.
    fn simulate_load(&self) -> Result<()> {
        let started = Instant::now();
        while started.elapsed() < self.load_delay {
            if self.closed.load(Ordering::SeqCst) {
                return Err(RenderServiceError::ContentLoad("page closed".to_string()));
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

impl PageDriver for MockPage {
    fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.stats
            .record(format!("viewport:{}x{}", viewport.width, viewport.height));
        if let Ok(mut current) = self.viewport.lock() {
            *current = viewport;
        }
        Ok(())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.stats.record(format!("navigate:{}", url));
        Ok(())
    }

    fn wait_until_navigated(&self) -> Result<()> {
        self.stats.record("wait".to_string());
        self.simulate_load()?;
        match &self.failure {
            MockFailure::Load(message) => Err(RenderServiceError::ContentLoad(message.clone())),
            _ => Ok(()),
        }
    }

    fn set_content(&self, html: &str) -> Result<()> {
        self.stats.record(format!("content:{}", html));
        Ok(())
    }

    fn print_to_pdf(&self, options: PrintToPdfOptions) -> Result<Vec<u8>> {
        self.stats.record(format!(
            "pdf:background={}",
            options.print_background.unwrap_or(false)
        ));
        match &self.failure {
            MockFailure::Render(message) => Err(RenderServiceError::Render(message.clone())),
            _ => Ok(MOCK_PDF.to_vec()),
        }
    }

    fn capture_full_page_png(&self) -> Result<Vec<u8>> {
        self.stats.record("screenshot".to_string());
        if let MockFailure::Render(message) = &self.failure {
            return Err(RenderServiceError::Render(message.clone()));
        }

        let viewport = self
            .viewport
            .lock()
            .map(|v| *v)
            .unwrap_or(DEFAULT_VIEWPORT);

        // Full-page height follows the document, not the viewport
        Ok(png_header(
            viewport.width,
            self.content_height.max(viewport.height),
        ))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.stats.record("close".to_string());
        match &self.failure {
            MockFailure::Close(message) => Err(RenderServiceError::Render(message.clone())),
            _ => Ok(()),
        }
    }
}

/// PNG signature followed by IHDR and IEND chunks for a `width`x`height`
/// RGBA image. Enough for header-based size probing.
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut png = Vec::with_capacity(45);
    png.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    png.extend_from_slice(&13u32.to_be_bytes());
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&width.to_be_bytes());
    png.extend_from_slice(&height.to_be_bytes());
    // bit depth, colour type (RGBA), compression, filter, interlace
    png.extend_from_slice(&[8, 6, 0, 0, 0]);
    png.extend_from_slice(&[0, 0, 0, 0]);
    png.extend_from_slice(&0u32.to_be_bytes());
    png.extend_from_slice(b"IEND");
    png.extend_from_slice(&[0xAE, 0x42, 0x60, 0x82]);
    png
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_launcher_always_fails() {
        let launcher = MockLauncher::always_fails("Test error");

        match launcher.launch() {
            Err(RenderServiceError::BrowserLaunch(msg)) => assert_eq!(msg, "Test error"),
            _ => panic!("Expected BrowserLaunch error"),
        }
        assert_eq!(launcher.stats().launch_count(), 1);
        assert_eq!(launcher.stats().close_count(), 0);
    }

    #[test]
    fn test_mock_page_records_events() {
        let launcher = MockLauncher::new();
        let stats = launcher.stats();

        let page = launcher.launch().unwrap();
        page.set_viewport(Viewport {
            width: 800,
            height: 600,
        })
        .unwrap();
        page.navigate("https://example.com/").unwrap();
        page.wait_until_navigated().unwrap();
        page.close().unwrap();

        assert_eq!(
            stats.events(),
            vec![
                "launch",
                "viewport:800x600",
                "navigate:https://example.com/",
                "wait",
                "close"
            ]
        );
        assert_eq!(stats.close_count(), 1);
    }

    #[test]
    fn test_mock_page_load_failure() {
        let page = MockLauncher::failing_load("timeout").launch().unwrap();
        page.navigate("https://example.com/").unwrap();
        assert!(matches!(
            page.wait_until_navigated(),
            Err(RenderServiceError::ContentLoad(_))
        ));
    }

    #[test]
    fn test_mock_screenshot_uses_content_height() {
        let page = MockLauncher::new()
            .with_content_height(5000)
            .launch()
            .unwrap();
        let png = page.capture_full_page_png().unwrap();

        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(&png[16..20], &1920u32.to_be_bytes());
        assert_eq!(&png[20..24], &5000u32.to_be_bytes());
    }

    #[test]
    fn test_mock_close_counts_once() {
        let launcher = MockLauncher::new();
        let stats = launcher.stats();

        let page = launcher.launch().unwrap();
        page.close().unwrap();
        page.close().unwrap();

        assert_eq!(stats.close_count(), 1);
        assert_eq!(stats.events(), vec!["launch", "close"]);
    }

    #[test]
    fn test_close_interrupts_slow_load() {
        let launcher = MockLauncher::new().with_load_delay(Duration::from_secs(10));
        let page: Arc<dyn PageDriver> = Arc::from(launcher.launch().unwrap());

        let waiter = {
            let page = Arc::clone(&page);
            std::thread::spawn(move || page.wait_until_navigated())
        };

        std::thread::sleep(Duration::from_millis(20));
        let started = Instant::now();
        page.close().unwrap();
        let result = waiter.join().unwrap();

        assert!(matches!(result, Err(RenderServiceError::ContentLoad(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_mock_pdf_signature() {
        let page = MockLauncher::new().launch().unwrap();
        let pdf = page.print_to_pdf(PrintToPdfOptions::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }
}
