//! Amazon S3 object store.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

use super::{ObjectStore, PutObject};
use crate::error::{RenderServiceError, Result};

/// [`ObjectStore`] backed by the AWS SDK.
///
/// Credentials and region come from the standard AWS provider chain
/// (environment, profile, or the function's execution role).
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default provider chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, object: PutObject) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .content_type(object.content_type)
            .body(ByteStream::from(object.body));

        if object.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request.send().await.map_err(|e| {
            log::error!(
                "❌ Upload to s3://{}/{} failed: {}",
                object.bucket,
                object.key,
                e
            );
            RenderServiceError::Delivery(DisplayErrorContext(&e).to_string())
        })?;

        Ok(())
    }
}
