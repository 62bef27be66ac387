//! Content loading and artifact rendering.
//!
//! Both functions here run against a live [`PageDriver`] and block the
//! calling thread; the service calls them from a blocking task.
//!
//! # Load Barrier
//!
//! ```text
//! set_viewport (optional) ──► navigate (arms wait, then issues) ──► wait_until_navigated
//!                                   ▲                                        │
//!              about:blank (inline) ┘└ remote URL                            ▼
//!                                                     set_content (inline HTML only,
//!                                                     blocks until the document loads)
//! ```
//!
//! Navigation arms its wait before it is issued. Inline markup is then
//! written into the blank document rather than packed into a `data:` URL,
//! so its size is not bounded by URL length limits, and `set_content`
//! observes load completion as page state rather than as an event that
//! could already have fired.

use std::time::Instant;

use headless_chrome::types::PrintToPdfOptions;
use serde::{Deserialize, Serialize};

use crate::browser::PageDriver;
use crate::error::{RenderServiceError, Result};
use crate::request::{ContentSource, RenderMode, RenderRequest};

// ============================================================================
// Artifact Types
// ============================================================================

/// Media kind of a rendered artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    Png,
}

impl MediaKind {
    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Pdf => "application/pdf",
            MediaKind::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Pdf => "pdf",
            MediaKind::Png => "png",
        }
    }
}

/// Pixel dimensions of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Bytes produced by one render, consumed by exactly one delivery.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    bytes: Vec<u8>,
    kind: MediaKind,
    dimensions: Option<Dimensions>,
}

impl RenderedArtifact {
    /// Wrap printed PDF bytes.
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            kind: MediaKind::Pdf,
            dimensions: None,
        }
    }

    /// Wrap PNG bytes, reading the dimensions from the encoded header.
    ///
    /// # Errors
    ///
    /// Returns [`RenderServiceError::Render`] if the bytes are not a readable
    /// image.
    pub fn png(bytes: Vec<u8>) -> Result<Self> {
        let dimensions = image_dimensions(&bytes)?;
        Ok(Self {
            bytes,
            kind: MediaKind::Png,
            dimensions: Some(dimensions),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Only set for screenshots.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Read pixel dimensions from an encoded image header.
pub fn image_dimensions(bytes: &[u8]) -> Result<Dimensions> {
    let size = imagesize::blob_size(bytes).map_err(|e| {
        log::error!("❌ Could not read screenshot dimensions: {}", e);
        RenderServiceError::Render(format!("unreadable screenshot: {}", e))
    })?;

    let to_u32 = |v: usize| {
        u32::try_from(v).map_err(|_| {
            RenderServiceError::Render(format!("screenshot dimension {} out of range", v))
        })
    };

    Ok(Dimensions {
        width: to_u32(size.width)?,
        height: to_u32(size.height)?,
    })
}

// ============================================================================
// Content Loader
// ============================================================================

/// Drive the page to its loaded state.
///
/// # Errors
///
/// Returns [`RenderServiceError::ContentLoad`] if the viewport cannot be set,
/// navigation cannot start, or the page does not settle in time.
pub fn load_content(page: &dyn PageDriver, request: &RenderRequest) -> Result<()> {
    let start = Instant::now();

    if let Some(viewport) = request.viewport() {
        page.set_viewport(viewport)?;
    }

    match request.source() {
        ContentSource::Html(html) => {
            log::debug!("Loading content ({} bytes of HTML)", html.len());
            page.navigate(BLANK_PAGE)?;
            page.wait_until_navigated()?;
            page.set_content(html)?;
        }
        ContentSource::Url(url) => {
            log::debug!("Loading content from {}", truncate_url(url, 100));
            page.navigate(url)?;
            page.wait_until_navigated()?;
        }
    }

    log::debug!("Content loaded in {:?}", start.elapsed());
    Ok(())
}

/// Document inline markup is written into.
pub const BLANK_PAGE: &str = "about:blank";

// ============================================================================
// Artifact Renderer
// ============================================================================

/// Produce the requested artifact from a loaded page.
///
/// # Errors
///
/// Returns [`RenderServiceError::Render`] if printing or capture fails.
pub fn render_artifact(page: &dyn PageDriver, request: &RenderRequest) -> Result<RenderedArtifact> {
    let start = Instant::now();

    let artifact = match request.render_mode() {
        RenderMode::Pdf => {
            log::debug!("Rendering PDF");
            RenderedArtifact::pdf(page.print_to_pdf(build_print_options(request))?)
        }
        RenderMode::Screenshot => {
            log::debug!("Rendering full-page screenshot");
            RenderedArtifact::png(page.capture_full_page_png()?)?
        }
    };

    log::debug!(
        "Rendered {} in {:?} ({} bytes)",
        artifact.kind().extension(),
        start.elapsed(),
        artifact.size()
    );

    Ok(artifact)
}

/// Resolve the request's format and margins into one options block.
pub fn build_print_options(request: &RenderRequest) -> PrintToPdfOptions {
    let (paper_width, paper_height) = request.format().paper_size_inches();
    let margin = request.margin();

    PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(request.print_background()),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(margin.top),
        margin_right: Some(margin.right),
        margin_bottom: Some(margin.bottom),
        margin_left: Some(margin.left),
        ..Default::default()
    }
}

fn truncate_url(url: &str, max_len: usize) -> String {
    if url.len() <= max_len {
        return url.to_string();
    }
    let mut end = max_len;
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &url[..end])
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserLauncher;
    use crate::browser::mock::{MOCK_PDF, MockLauncher, png_header};
    use crate::request::{DeliveryMode, Envelope, RenderRequest};
    use serde_json::{Value, json};

    fn request(value: Value) -> RenderRequest {
        let payload = Envelope::from_value(value).payload().unwrap();
        RenderRequest::from_payload(payload, DeliveryMode::Inline).unwrap()
    }

    #[test]
    fn test_load_html_sets_content_after_blank_page() {
        let launcher = MockLauncher::new();
        let stats = launcher.stats();
        let page = launcher.launch().unwrap();

        load_content(page.as_ref(), &request(json!({ "html": "<h1>Hello</h1>" }))).unwrap();

        assert_eq!(
            stats.events(),
            vec![
                "launch",
                "navigate:about:blank",
                "wait",
                "content:<h1>Hello</h1>"
            ]
        );
    }

    #[test]
    fn test_load_large_html_is_passed_through_verbatim() {
        let launcher = MockLauncher::new();
        let stats = launcher.stats();
        let page = launcher.launch().unwrap();

        // Well past Chrome's 2 MB URL limit once percent-encoded
        let html = format!("<table>{}</table>", "<tr><td>&amp; 100%</td></tr>".repeat(100_000));
        load_content(page.as_ref(), &request(json!({ "html": html.as_str() }))).unwrap();

        let events = stats.events();
        assert_eq!(events[1], "navigate:about:blank");
        assert_eq!(events[3], format!("content:{}", html));
        assert!(events.iter().all(|e| !e.starts_with("navigate:data:")));
    }

    #[test]
    fn test_load_applies_viewport_before_navigation() {
        let launcher = MockLauncher::new();
        let stats = launcher.stats();
        let page = launcher.launch().unwrap();

        load_content(
            page.as_ref(),
            &request(json!({
                "url": "https://example.com",
                "viewportWidth": 1024,
                "viewportHeight": 768
            })),
        )
        .unwrap();

        assert_eq!(
            stats.events(),
            vec![
                "launch",
                "viewport:1024x768",
                "navigate:https://example.com/",
                "wait"
            ]
        );
    }

    #[test]
    fn test_load_failure_is_content_load_error() {
        let page = MockLauncher::failing_load("timeout").launch().unwrap();
        let result = load_content(page.as_ref(), &request(json!({ "html": "<p/>" })));
        assert!(matches!(result, Err(RenderServiceError::ContentLoad(_))));
    }

    #[test]
    fn test_render_pdf() {
        let page = MockLauncher::new().launch().unwrap();
        let artifact = render_artifact(page.as_ref(), &request(json!({ "html": "<p/>" }))).unwrap();

        assert_eq!(artifact.kind(), MediaKind::Pdf);
        assert_eq!(artifact.bytes(), MOCK_PDF);
        assert_eq!(artifact.dimensions(), None);
    }

    #[test]
    fn test_render_screenshot_reads_encoded_dimensions() {
        let page = MockLauncher::new()
            .with_content_height(4321)
            .launch()
            .unwrap();
        let artifact = render_artifact(
            page.as_ref(),
            &request(json!({ "html": "<p/>", "renderScreenshot": true })),
        )
        .unwrap();

        assert_eq!(artifact.kind(), MediaKind::Png);
        assert_eq!(
            artifact.dimensions(),
            Some(Dimensions {
                width: 1920,
                height: 4321
            })
        );
    }

    #[test]
    fn test_render_failure_is_render_error() {
        let page = MockLauncher::failing_render("crashed").launch().unwrap();
        let result = render_artifact(page.as_ref(), &request(json!({ "html": "<p/>" })));
        assert!(matches!(result, Err(RenderServiceError::Render(_))));
    }

    #[test]
    fn test_image_dimensions() {
        let dims = image_dimensions(&png_header(640, 480)).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 640,
                height: 480
            }
        );
        assert!(image_dimensions(b"not an image").is_err());
    }

    #[test]
    fn test_build_print_options_defaults() {
        let options = build_print_options(&request(json!({ "html": "<p/>" })));

        assert_eq!(options.paper_width, Some(8.27));
        assert_eq!(options.paper_height, Some(11.7));
        assert_eq!(options.print_background, Some(false));
        assert_eq!(options.margin_top, Some(1.0));
        assert_eq!(options.margin_right, Some(1.0));
        assert_eq!(options.margin_bottom, Some(1.0));
        assert_eq!(options.margin_left, Some(1.0));
        assert_eq!(options.display_header_footer, Some(false));
    }

    #[test]
    fn test_build_print_options_custom() {
        let options = build_print_options(&request(json!({
            "html": "<p/>",
            "format": "Letter",
            "printBackground": true,
            "margin": { "top": "0in", "right": "0in", "bottom": "0in", "left": "0in" }
        })));

        assert_eq!(options.paper_width, Some(8.5));
        assert_eq!(options.paper_height, Some(11.0));
        assert_eq!(options.print_background, Some(true));
        assert_eq!(options.margin_top, Some(0.0));
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(MediaKind::Pdf.content_type(), "application/pdf");
        assert_eq!(MediaKind::Png.content_type(), "image/png");
        assert_eq!(MediaKind::Pdf.extension(), "pdf");
        assert_eq!(MediaKind::Png.extension(), "png");
    }

    #[test]
    fn test_truncate_url() {
        assert_eq!(truncate_url("https://example.com", 50), "https://example.com");
        let truncated = truncate_url("https://example.com/very/long/path", 10);
        assert_eq!(truncated, "https://ex...");
    }
}
