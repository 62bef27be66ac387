//! In-memory object store for testing.
//!
//! This module is only available when the `test-utils` feature is enabled or
//! during testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ObjectStore, PutObject};
use crate::error::{RenderServiceError, Result};

/// Records every put; optionally fails them all.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<Vec<PutObject>>>,
    failure: Option<String>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every put fails with `message`.
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            objects: Arc::default(),
            failure: Some(message.into()),
        }
    }

    /// Objects stored so far, in order.
    pub fn objects(&self) -> Vec<PutObject> {
        self.objects.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn put_count(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, object: PutObject) -> Result<()> {
        if let Some(message) = &self.failure {
            return Err(RenderServiceError::Delivery(message.clone()));
        }

        self.objects
            .lock()
            .map_err(|_| RenderServiceError::Delivery("store lock poisoned".to_string()))?
            .push(object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(key: &str) -> PutObject {
        PutObject {
            bucket: "bucket".to_string(),
            key: key.to_string(),
            content_type: "application/pdf",
            body: b"%PDF-".to_vec(),
            public_read: true,
        }
    }

    #[test]
    fn test_memory_store_records_puts() {
        let store = MemoryObjectStore::new();
        tokio_test::block_on(store.put_object(object("a/one.pdf"))).unwrap();
        tokio_test::block_on(store.put_object(object("b/two.pdf"))).unwrap();

        assert_eq!(store.put_count(), 2);
        assert_eq!(store.objects()[1].key, "b/two.pdf");
    }

    #[test]
    fn test_failing_store() {
        let store = MemoryObjectStore::failing("access denied");
        let result = tokio_test::block_on(store.put_object(object("a/one.pdf")));

        assert!(matches!(result, Err(RenderServiceError::Delivery(_))));
        assert_eq!(store.put_count(), 0);
    }
}
