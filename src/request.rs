//! Request normalization.
//!
//! This module turns a raw invocation envelope into an immutable
//! [`RenderRequest`]. It covers both envelope shapes a function runtime can
//! hand us:
//!
//! - **Gateway framing**: the payload is a JSON-encoded string in `body`
//!   (optionally base64-encoded, flagged by `isBase64Encoded`).
//! - **Direct invocation**: the envelope object *is* the payload.
//!
//! # Flow
//!
//! ```text
//! serde_json::Value ──► Envelope ──► (access guard) ──► RenderPayload ──► RenderRequest
//!                       headers                         raw fields        validated, resolved
//! ```
//!
//! Decoding the payload is deferred until [`Envelope::payload`] is called so
//! the access guard can run on headers alone.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_render::request::{DeliveryMode, Envelope, RenderMode, RenderRequest};
//! use serde_json::json;
//!
//! let envelope = Envelope::from_value(json!({
//!     "body": "{\"html\":\"<h1>Hello</h1>\",\"renderScreenshot\":true}"
//! }));
//! let payload = envelope.payload().unwrap();
//! let request = RenderRequest::from_payload(payload, DeliveryMode::Inline).unwrap();
//!
//! assert_eq!(request.render_mode(), RenderMode::Screenshot);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RenderServiceError, Result};

/// Default page format when the request does not name one.
pub const DEFAULT_FORMAT: PageFormat = PageFormat::A4;

/// Default margin on every side, in inches.
pub const DEFAULT_MARGIN_INCHES: f64 = 1.0;

const PX_PER_INCH: f64 = 96.0;

// ============================================================================
// Envelope
// ============================================================================

/// Raw invocation envelope, split into headers and a not-yet-decoded payload.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// Header map with lowercased keys.
    headers: HashMap<String, String>,

    /// Gateway body, if the envelope carried one as a string.
    body: Option<String>,

    /// Whether `body` is base64 transport-encoded.
    body_base64: bool,

    /// Payload to use when there is no string body.
    direct: Value,
}

impl Envelope {
    /// Split a raw event into headers and payload source.
    ///
    /// Never fails: a malformed body is only reported when
    /// [`payload()`](Self::payload) decodes it.
    pub fn from_value(event: Value) -> Self {
        let headers: HashMap<String, String> = match event.get("headers") {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.to_ascii_lowercase(), v.to_string())))
                .collect(),
            _ => HashMap::new(),
        };

        let body_base64 = event
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        match event.get("body") {
            // An empty body is no body; the payload is the envelope itself
            Some(Value::String(body)) if !body.trim().is_empty() => Self {
                headers,
                body: Some(body.clone()),
                body_base64,
                direct: Value::Null,
            },
            // Some callers send the payload as an object under `body`
            Some(body @ Value::Object(_)) => Self {
                headers,
                body: None,
                body_base64: false,
                direct: body.clone(),
            },
            _ => Self {
                headers,
                body: None,
                body_base64: false,
                direct: event,
            },
        }
    }

    /// Build an envelope from transport parts (HTTP headers and raw body).
    pub fn from_parts<I, K, V>(headers: I, body: Option<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            body,
            body_base64: false,
            direct: Value::Null,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decode the payload.
    ///
    /// A blank string body counts as no body.
    ///
    /// # Errors
    ///
    /// Returns [`RenderServiceError::MissingSource`] if neither `html` nor
    /// `url` is present, whatever else is wrong with the payload.
    /// Returns [`RenderServiceError::InvalidRequest`] if the body is not valid
    /// base64 (when flagged), not valid JSON or not a JSON object, or if a
    /// field has the wrong type.
    pub fn payload(&self) -> Result<RenderPayload> {
        match self.body.as_deref().filter(|b| !b.trim().is_empty()) {
            Some(body) => {
                let decoded;
                let text = if self.body_base64 {
                    let bytes = BASE64.decode(body.trim()).map_err(|e| {
                        log::debug!("Body base64 decoding failed: {}", e);
                        RenderServiceError::InvalidRequest(format!("body is not valid base64: {}", e))
                    })?;
                    decoded = String::from_utf8(bytes).map_err(|e| {
                        RenderServiceError::InvalidRequest(format!("body is not valid UTF-8: {}", e))
                    })?;
                    decoded.as_str()
                } else {
                    body
                };

                let value: Value = serde_json::from_str(text).map_err(|e| {
                    log::debug!("Body JSON decoding failed: {}", e);
                    RenderServiceError::InvalidRequest(format!("body is not valid JSON: {}", e))
                })?;
                RenderPayload::from_json(&value)
            }
            None => RenderPayload::from_json(&self.direct),
        }
    }
}

// ============================================================================
// Wire payload
// ============================================================================

/// Payload fields exactly as callers send them.
///
/// Unknown fields are ignored, since a directly-invoked envelope also carries
/// transport fields such as `headers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    /// Inline HTML markup.
    #[serde(default)]
    pub html: Option<String>,

    /// Remote page to navigate to.
    #[serde(default)]
    pub url: Option<String>,

    /// Base name for the uploaded object (no extension).
    #[serde(default)]
    pub file_name: Option<String>,

    /// Page-size token such as `A4` or `Letter`.
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub print_background: Option<bool>,

    #[serde(default)]
    pub margin: Option<MarginPayload>,

    #[serde(default)]
    pub viewport_width: Option<u32>,

    #[serde(default)]
    pub viewport_height: Option<u32>,

    /// Capture a full-page PNG instead of printing a PDF.
    #[serde(default)]
    pub render_screenshot: Option<bool>,
}

impl RenderPayload {
    /// Source fields, checked on the raw JSON before the typed decode.
    const SOURCE_FIELDS: [&'static str; 2] = ["html", "url"];

    /// Decode a payload from JSON, reporting a missing source ahead of any
    /// type error in the other fields.
    ///
    /// `null` is treated as an empty object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let fields = match value {
            Value::Object(fields) => Some(fields),
            Value::Null => None,
            other => {
                log::debug!("Payload is not a JSON object: {}", other);
                return Err(RenderServiceError::InvalidRequest(
                    "payload must be a JSON object".to_string(),
                ));
            }
        };

        let has_source = fields.is_some_and(|fields| {
            Self::SOURCE_FIELDS
                .iter()
                .any(|name| match fields.get(*name) {
                    None | Some(Value::Null) => false,
                    Some(Value::String(s)) => !s.trim().is_empty(),
                    Some(_) => true,
                })
        });
        if !has_source {
            log::debug!("Request rejected: no html or url supplied");
            return Err(RenderServiceError::MissingSource);
        }

        Self::deserialize(value).map_err(|e| {
            log::debug!("Payload decoding failed: {}", e);
            RenderServiceError::InvalidRequest(e.to_string())
        })
    }
}

/// Per-side margin lengths as sent by callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginPayload {
    #[serde(default)]
    pub top: Option<Length>,
    #[serde(default)]
    pub right: Option<Length>,
    #[serde(default)]
    pub bottom: Option<Length>,
    #[serde(default)]
    pub left: Option<Length>,
}

/// A CSS-like length: a bare number (pixels) or a token such as `"1in"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    Pixels(f64),
    Token(String),
}

impl Length {
    /// Resolve to inches.
    ///
    /// Supported units: `px` (96 per inch), `in`, `cm`, `mm`. A token with no
    /// unit is read as pixels.
    pub fn to_inches(&self) -> Result<f64> {
        let px = match self {
            Length::Pixels(px) => *px,
            Length::Token(token) => parse_length_px(token)?,
        };

        if !px.is_finite() || px < 0.0 {
            return Err(RenderServiceError::InvalidRequest(format!(
                "margin must be a non-negative length, got {:?}",
                self
            )));
        }

        Ok(px / PX_PER_INCH)
    }
}

fn parse_length_px(token: &str) -> Result<f64> {
    let token = token.trim().to_ascii_lowercase();
    let invalid = || RenderServiceError::InvalidRequest(format!("invalid margin length '{}'", token));

    let (number, px_per_unit) = if let Some(n) = token.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = token.strip_suffix("in") {
        (n, PX_PER_INCH)
    } else if let Some(n) = token.strip_suffix("cm") {
        (n, 37.8)
    } else if let Some(n) = token.strip_suffix("mm") {
        (n, 3.78)
    } else {
        (token.as_str(), 1.0)
    };

    number
        .trim()
        .parse::<f64>()
        .map(|n| n * px_per_unit)
        .map_err(|_| invalid())
}

// ============================================================================
// Resolved request
// ============================================================================

/// Where the page content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    /// Inline markup.
    Html(String),
    /// Validated, normalized URL.
    Url(String),
}

/// Artifact kind to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Pdf,
    Screenshot,
}

/// How the artifact leaves the invocation.
///
/// Chosen by deployment configuration, never by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Base64 in the response body.
    #[default]
    Inline,
    /// Public object in storage, URL in the response body.
    Upload,
}

impl FromStr for DeliveryMode {
    type Err = RenderServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(DeliveryMode::Inline),
            "upload" | "s3" => Ok(DeliveryMode::Upload),
            other => Err(RenderServiceError::Configuration(format!(
                "unknown delivery mode '{}' (expected 'inline' or 'upload')",
                other
            ))),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Inline => f.write_str("inline"),
            DeliveryMode::Upload => f.write_str("upload"),
        }
    }
}

/// Paper size names understood by the `format` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PageFormat {
    /// Paper `(width, height)` in inches.
    pub fn paper_size_inches(self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Tabloid => (11.0, 17.0),
            PageFormat::Ledger => (17.0, 11.0),
            PageFormat::A0 => (33.1, 46.8),
            PageFormat::A1 => (23.4, 33.1),
            PageFormat::A2 => (16.54, 23.4),
            PageFormat::A3 => (11.7, 16.54),
            PageFormat::A4 => (8.27, 11.7),
            PageFormat::A5 => (5.83, 8.27),
            PageFormat::A6 => (4.13, 5.83),
        }
    }
}

impl FromStr for PageFormat {
    type Err = RenderServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            "tabloid" => Ok(PageFormat::Tabloid),
            "ledger" => Ok(PageFormat::Ledger),
            "a0" => Ok(PageFormat::A0),
            "a1" => Ok(PageFormat::A1),
            "a2" => Ok(PageFormat::A2),
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            "a6" => Ok(PageFormat::A6),
            other => Err(RenderServiceError::InvalidRequest(format!(
                "unknown page format '{}'",
                other
            ))),
        }
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN_INCHES,
            right: DEFAULT_MARGIN_INCHES,
            bottom: DEFAULT_MARGIN_INCHES,
            left: DEFAULT_MARGIN_INCHES,
        }
    }
}

impl Margin {
    fn resolve(payload: Option<&MarginPayload>) -> Result<Self> {
        let Some(payload) = payload else {
            return Ok(Self::default());
        };

        let side = |len: &Option<Length>| -> Result<f64> {
            len.as_ref()
                .map(Length::to_inches)
                .unwrap_or(Ok(DEFAULT_MARGIN_INCHES))
        };

        Ok(Self {
            top: side(&payload.top)?,
            right: side(&payload.right)?,
            bottom: side(&payload.bottom)?,
            left: side(&payload.left)?,
        })
    }
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A validated render request.
///
/// Constructed once per invocation by [`from_payload`](Self::from_payload)
/// and read-only afterwards.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    source: ContentSource,
    file_name: Option<String>,
    format: PageFormat,
    print_background: bool,
    margin: Margin,
    viewport: Option<Viewport>,
    render_mode: RenderMode,
    delivery_mode: DeliveryMode,
}

impl RenderRequest {
    /// Validate a payload and resolve its defaults.
    ///
    /// # Errors
    ///
    /// - [`RenderServiceError::MissingSource`] if neither `html` nor `url` is set
    /// - [`RenderServiceError::ConflictingSource`] if both are set
    /// - [`RenderServiceError::InvalidUrl`] if `url` does not parse
    /// - [`RenderServiceError::MissingFileName`] if `delivery_mode` is upload
    ///   and `fileName` is absent
    /// - [`RenderServiceError::InvalidRequest`] for bad format, margin or
    ///   viewport values
    pub fn from_payload(payload: RenderPayload, delivery_mode: DeliveryMode) -> Result<Self> {
        let html = payload.html.filter(|h| !h.trim().is_empty());
        let url = payload.url.filter(|u| !u.trim().is_empty());

        let source = match (html, url) {
            (Some(html), None) => ContentSource::Html(html),
            (None, Some(url)) => ContentSource::Url(validate_url(&url)?),
            (Some(_), Some(_)) => {
                log::debug!("Request rejected: both html and url supplied");
                return Err(RenderServiceError::ConflictingSource);
            }
            (None, None) => {
                log::debug!("Request rejected: no html or url supplied");
                return Err(RenderServiceError::MissingSource);
            }
        };

        let file_name = payload
            .file_name
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        if delivery_mode == DeliveryMode::Upload && file_name.is_none() {
            log::debug!("Request rejected: upload delivery without fileName");
            return Err(RenderServiceError::MissingFileName);
        }

        let format = match payload.format.as_deref() {
            Some(token) if !token.trim().is_empty() => token.parse()?,
            _ => DEFAULT_FORMAT,
        };

        let viewport = match (payload.viewport_width, payload.viewport_height) {
            (Some(0), Some(_)) | (Some(_), Some(0)) => {
                return Err(RenderServiceError::InvalidRequest(
                    "viewport dimensions must be positive".to_string(),
                ));
            }
            (Some(width), Some(height)) => Some(Viewport { width, height }),
            _ => None,
        };

        let render_mode = if payload.render_screenshot.unwrap_or(false) {
            RenderMode::Screenshot
        } else {
            RenderMode::Pdf
        };

        Ok(Self {
            source,
            file_name,
            format,
            print_background: payload.print_background.unwrap_or(false),
            margin: Margin::resolve(payload.margin.as_ref())?,
            viewport,
            render_mode,
            delivery_mode,
        })
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn format(&self) -> PageFormat {
        self.format
    }

    pub fn print_background(&self) -> bool {
        self.print_background
    }

    pub fn margin(&self) -> Margin {
        self.margin
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery_mode
    }
}

/// Parse and normalize a URL source.
fn validate_url(url: &str) -> Result<String> {
    match url::Url::parse(url.trim()) {
        Ok(parsed) => {
            log::trace!("URL validated successfully: {}", parsed);
            Ok(parsed.to_string())
        }
        Err(e) => {
            log::debug!("URL validation failed for '{}': {}", url, e);
            Err(RenderServiceError::InvalidUrl(e.to_string()))
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> RenderPayload {
        Envelope::from_value(value).payload().unwrap()
    }

    // -------------------------------------------------------------------------
    // Envelope
    // -------------------------------------------------------------------------

    #[test]
    fn test_envelope_direct_payload() {
        let p = payload(json!({ "html": "<h1>Hello</h1>", "format": "Letter" }));
        assert_eq!(p.html.as_deref(), Some("<h1>Hello</h1>"));
        assert_eq!(p.format.as_deref(), Some("Letter"));
    }

    #[test]
    fn test_envelope_string_body() {
        let p = payload(json!({
            "headers": { "Content-Type": "application/json" },
            "body": "{\"url\":\"https://example.com\",\"fileName\":\"report\"}"
        }));
        assert_eq!(p.url.as_deref(), Some("https://example.com"));
        assert_eq!(p.file_name.as_deref(), Some("report"));
    }

    #[test]
    fn test_envelope_base64_body() {
        let body = BASE64.encode(r#"{"html":"<p>x</p>"}"#);
        let p = payload(json!({ "body": body, "isBase64Encoded": true }));
        assert_eq!(p.html.as_deref(), Some("<p>x</p>"));
    }

    #[test]
    fn test_envelope_object_body() {
        let p = payload(json!({ "body": { "html": "<p>x</p>" } }));
        assert_eq!(p.html.as_deref(), Some("<p>x</p>"));
    }

    #[test]
    fn test_envelope_malformed_body() {
        let envelope = Envelope::from_value(json!({ "body": "{not json" }));
        assert!(matches!(
            envelope.payload(),
            Err(RenderServiceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_envelope_empty_body_uses_envelope() {
        let p = payload(json!({ "body": "", "html": "<p>x</p>" }));
        assert_eq!(p.html.as_deref(), Some("<p>x</p>"));

        let blank = Envelope::from_value(json!({ "body": "  " }));
        assert!(matches!(blank.payload(), Err(RenderServiceError::MissingSource)));

        let parts = Envelope::from_parts(Vec::<(String, String)>::new(), Some(String::new()));
        assert!(matches!(parts.payload(), Err(RenderServiceError::MissingSource)));
    }

    #[test]
    fn test_envelope_headers_case_insensitive() {
        let envelope = Envelope::from_value(json!({
            "headers": { "Authorization": "Bearer abc" }
        }));
        assert_eq!(envelope.header("authorization"), Some("Bearer abc"));
        assert_eq!(envelope.header("AUTHORIZATION"), Some("Bearer abc"));
    }

    #[test]
    fn test_envelope_null_headers() {
        let envelope = Envelope::from_value(json!({ "headers": null, "html": "x" }));
        assert_eq!(envelope.header("authorization"), None);
    }

    #[test]
    fn test_envelope_from_parts() {
        let envelope = Envelope::from_parts(
            [("X-Custom", "1")],
            Some(r#"{"html":"<b>hi</b>"}"#.to_string()),
        );
        assert_eq!(envelope.header("x-custom"), Some("1"));
        assert_eq!(envelope.payload().unwrap().html.as_deref(), Some("<b>hi</b>"));
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    #[test]
    fn test_missing_source() {
        let result = RenderRequest::from_payload(RenderPayload::default(), DeliveryMode::Inline);
        assert!(matches!(result, Err(RenderServiceError::MissingSource)));

        let blank = RenderPayload {
            html: Some("  ".to_string()),
            ..Default::default()
        };
        let result = RenderRequest::from_payload(blank, DeliveryMode::Inline);
        assert!(matches!(result, Err(RenderServiceError::MissingSource)));

        for event in [json!({}), json!({ "html": "  " }), json!({ "url": null })] {
            assert!(matches!(
                Envelope::from_value(event).payload(),
                Err(RenderServiceError::MissingSource)
            ));
        }
    }

    #[test]
    fn test_missing_source_reported_before_type_errors() {
        let envelope = Envelope::from_value(json!({ "margin": "1in", "viewportWidth": "wide" }));
        assert!(matches!(
            envelope.payload(),
            Err(RenderServiceError::MissingSource)
        ));

        let body = Envelope::from_value(json!({ "body": "{\"format\": 4}" }));
        assert!(matches!(body.payload(), Err(RenderServiceError::MissingSource)));

        // With a source present the type error is what gets reported
        let envelope = Envelope::from_value(json!({ "html": "<p/>", "margin": "1in" }));
        assert!(matches!(
            envelope.payload(),
            Err(RenderServiceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let envelope = Envelope::from_value(json!({ "body": "[\"<p/>\"]" }));
        assert!(matches!(
            envelope.payload(),
            Err(RenderServiceError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_conflicting_source() {
        let result = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "url": "https://example.com" })),
            DeliveryMode::Inline,
        );
        assert!(matches!(result, Err(RenderServiceError::ConflictingSource)));
    }

    #[test]
    fn test_missing_file_name_only_for_upload() {
        let p = payload(json!({ "html": "<h1>Hello</h1>" }));

        let result = RenderRequest::from_payload(p.clone(), DeliveryMode::Upload);
        assert!(matches!(result, Err(RenderServiceError::MissingFileName)));

        let result = RenderRequest::from_payload(p, DeliveryMode::Inline);
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let result = RenderRequest::from_payload(
            payload(json!({ "url": "example.com" })),
            DeliveryMode::Inline,
        );
        assert!(matches!(result, Err(RenderServiceError::InvalidUrl(_))));
    }

    #[test]
    fn test_url_normalized() {
        let request = RenderRequest::from_payload(
            payload(json!({ "url": "https://example.com" })),
            DeliveryMode::Inline,
        )
        .unwrap();
        assert_eq!(
            request.source(),
            &ContentSource::Url("https://example.com/".to_string())
        );
    }

    #[test]
    fn test_defaults() {
        let request = RenderRequest::from_payload(
            payload(json!({ "html": "<h1>Hello</h1>" })),
            DeliveryMode::Inline,
        )
        .unwrap();

        assert_eq!(request.format(), PageFormat::A4);
        assert!(!request.print_background());
        assert_eq!(request.margin(), Margin::default());
        assert_eq!(request.viewport(), None);
        assert_eq!(request.render_mode(), RenderMode::Pdf);
        assert_eq!(request.delivery_mode(), DeliveryMode::Inline);
        assert_eq!(request.file_name(), None);
    }

    /// An explicit format must not switch background printing on.
    #[test]
    fn test_print_background_independent_of_format() {
        let request = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "format": "Letter" })),
            DeliveryMode::Inline,
        )
        .unwrap();
        assert_eq!(request.format(), PageFormat::Letter);
        assert!(!request.print_background());
    }

    #[test]
    fn test_unknown_format() {
        let result = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "format": "B7" })),
            DeliveryMode::Inline,
        );
        assert!(matches!(result, Err(RenderServiceError::InvalidRequest(_))));
    }

    #[test]
    fn test_partial_margin_defaults_missing_sides() {
        let request = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "margin": { "top": "2in", "left": 48 } })),
            DeliveryMode::Inline,
        )
        .unwrap();

        let margin = request.margin();
        assert_eq!(margin.top, 2.0);
        assert_eq!(margin.left, 0.5);
        assert_eq!(margin.right, DEFAULT_MARGIN_INCHES);
        assert_eq!(margin.bottom, DEFAULT_MARGIN_INCHES);
    }

    #[test]
    fn test_viewport_requires_both_dimensions() {
        let request = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "viewportWidth": 800 })),
            DeliveryMode::Inline,
        )
        .unwrap();
        assert_eq!(request.viewport(), None);

        let request = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "viewportWidth": 800, "viewportHeight": 600 })),
            DeliveryMode::Inline,
        )
        .unwrap();
        assert_eq!(
            request.viewport(),
            Some(Viewport {
                width: 800,
                height: 600
            })
        );
    }

    #[test]
    fn test_zero_viewport_rejected() {
        let result = RenderRequest::from_payload(
            payload(json!({ "html": "<p/>", "viewportWidth": 0, "viewportHeight": 600 })),
            DeliveryMode::Inline,
        );
        assert!(matches!(result, Err(RenderServiceError::InvalidRequest(_))));
    }

    // -------------------------------------------------------------------------
    // Tokens
    // -------------------------------------------------------------------------

    #[test]
    fn test_length_units() {
        let inches = |t: &str| Length::Token(t.to_string()).to_inches().unwrap();

        assert_eq!(inches("1in"), 1.0);
        assert_eq!(inches("96px"), 1.0);
        assert_eq!(inches("192"), 2.0);
        assert!((inches("2.54cm") - 1.0).abs() < 0.001);
        assert!((inches("25.4mm") - 1.0).abs() < 0.001);
        assert_eq!(Length::Pixels(0.0).to_inches().unwrap(), 0.0);
    }

    #[test]
    fn test_length_invalid() {
        assert!(Length::Token("1em".to_string()).to_inches().is_err());
        assert!(Length::Token("-1in".to_string()).to_inches().is_err());
        assert!(Length::Token("".to_string()).to_inches().is_err());
    }

    #[test]
    fn test_page_format_parse() {
        assert_eq!("a4".parse::<PageFormat>().unwrap(), PageFormat::A4);
        assert_eq!("LEGAL".parse::<PageFormat>().unwrap(), PageFormat::Legal);
        assert_eq!(PageFormat::Letter.paper_size_inches(), (8.5, 11.0));
    }

    #[test]
    fn test_delivery_mode_parse() {
        assert_eq!("inline".parse::<DeliveryMode>().unwrap(), DeliveryMode::Inline);
        assert_eq!("Upload".parse::<DeliveryMode>().unwrap(), DeliveryMode::Upload);
        assert!("ftp".parse::<DeliveryMode>().is_err());
        assert_eq!(DeliveryMode::Upload.to_string(), "upload");
    }
}
