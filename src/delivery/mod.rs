//! Artifact delivery.
//!
//! A rendered artifact leaves the service in one of two ways:
//!
//! | Mode | Result body |
//! |------|-------------|
//! | [`DeliveryMode::Inline`](crate::request::DeliveryMode::Inline) | base64 of the artifact bytes |
//! | [`DeliveryMode::Upload`](crate::request::DeliveryMode::Upload) | public URL of the stored object |
//!
//! Uploads go through the [`ObjectStore`] trait so the pipeline can be tested
//! without a cloud account.
//!
//! # Object Keys
//!
//! Every upload is written under a fresh random prefix:
//!
//! ```text
//! 3f6c0b9e2d7a4c1e9b8a5d4c3b2a1f0e/report.pdf
//! └──────────── uuid v4 ──────────┘ └ fileName + extension
//! ```
//!
//! Two uploads with the same `fileName` therefore never overwrite each other.

#[cfg(feature = "s3")]
mod s3;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use crate::error::{RenderServiceError, Result};
use crate::render::{Dimensions, MediaKind, RenderedArtifact};

/// One object to write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,

    /// Grant anonymous read access to the object.
    pub public_read: bool,
}

/// Write-only view of an object store.
///
/// # Errors
///
/// Implementations report every failure as
/// [`RenderServiceError::Delivery`](crate::RenderServiceError::Delivery).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, object: PutObject) -> Result<()>;
}

/// Outcome of delivering one artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResult {
    Inline {
        /// Base64 (standard alphabet, padded) of the artifact bytes.
        data: String,
        dimensions: Option<Dimensions>,
    },
    Uploaded {
        object_key: String,
        public_url: String,
        dimensions: Option<Dimensions>,
    },
}

impl DeliveryResult {
    /// The `data` field of the success body: base64 or URL.
    pub fn data(&self) -> &str {
        match self {
            DeliveryResult::Inline { data, .. } => data,
            DeliveryResult::Uploaded { public_url, .. } => public_url,
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            DeliveryResult::Inline { dimensions, .. }
            | DeliveryResult::Uploaded { dimensions, .. } => *dimensions,
        }
    }

    /// JSON body returned to the caller on success.
    pub fn to_body(&self) -> SuccessBody<'_> {
        SuccessBody {
            data: self.data(),
            dimensions: self.dimensions(),
        }
    }
}

/// Success response body: `{"data": ..., "dimensions": {...}}`.
///
/// `dimensions` is omitted for PDFs.
#[derive(Debug, Serialize)]
pub struct SuccessBody<'a> {
    pub data: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

/// Where [`deliver`] sends an artifact.
#[derive(Clone, Copy)]
pub enum Destination<'a> {
    Inline,
    Bucket {
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        public_domain: &'a str,
    },
}

/// Deliver one artifact to `destination`.
///
/// # Errors
///
/// - [`RenderServiceError::MissingFileName`] if uploading without a file name
/// - [`RenderServiceError::Delivery`] if the upload fails
pub async fn deliver(
    destination: Destination<'_>,
    file_name: Option<&str>,
    artifact: RenderedArtifact,
) -> Result<DeliveryResult> {
    match destination {
        Destination::Inline => Ok(inline(&artifact)),
        Destination::Bucket {
            store,
            bucket,
            public_domain,
        } => {
            let file_name = file_name.ok_or(RenderServiceError::MissingFileName)?;
            upload(store, bucket, public_domain, file_name, artifact).await
        }
    }
}

/// Encode the artifact into the response.
pub fn inline(artifact: &RenderedArtifact) -> DeliveryResult {
    DeliveryResult::Inline {
        data: BASE64.encode(artifact.bytes()),
        dimensions: artifact.dimensions(),
    }
}

/// Upload the artifact and return its public URL.
///
/// # Errors
///
/// Propagates the store's
/// [`RenderServiceError::Delivery`](crate::RenderServiceError::Delivery).
pub async fn upload(
    store: &dyn ObjectStore,
    bucket: &str,
    public_domain: &str,
    file_name: &str,
    artifact: RenderedArtifact,
) -> Result<DeliveryResult> {
    let kind = artifact.kind();
    let dimensions = artifact.dimensions();
    let key = object_key(file_name, kind);
    let size = artifact.size();

    log::debug!("Uploading {} bytes to s3://{}/{}", size, bucket, key);

    store
        .put_object(PutObject {
            bucket: bucket.to_string(),
            key: key.clone(),
            content_type: kind.content_type(),
            body: artifact.into_bytes(),
            public_read: true,
        })
        .await?;

    let url = public_url(public_domain, &key);
    log::info!("✅ Uploaded {} ({} bytes)", url, size);

    Ok(DeliveryResult::Uploaded {
        object_key: key,
        public_url: url,
        dimensions,
    })
}

/// `<random prefix>/<fileName>.<ext>`.
pub fn object_key(file_name: &str, kind: MediaKind) -> String {
    format!(
        "{}/{}.{}",
        uuid::Uuid::new_v4().simple(),
        file_name,
        kind.extension()
    )
}

/// `https://<domain>/<key>`, with each path segment percent-encoded.
pub fn public_url(domain: &str, key: &str) -> String {
    let path = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("https://{}/{}", domain.trim_end_matches('/'), path)
}

// ============================================================================
// Unit Tests
// ============================================================================
