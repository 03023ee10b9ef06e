//! Store-and-link delivery.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::extraction::ExtractedMedia;
use crate::storage::{ObjectKey, ObjectStore, SignedLink, StorageError};

/// Uploads the produced file and issues a time-limited download link.
///
/// This strategy never touches the workspace; the caller releases it once
/// delivery has concluded, whatever the outcome.
#[derive(Clone)]
pub struct StoreAndLink {
    store: Arc<dyn ObjectStore>,
    ttl: Duration,
}

impl StoreAndLink {
    /// Default link lifetime: 1 hour.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    /// Create a strategy over `store` with the default link lifetime.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            ttl: Self::DEFAULT_TTL,
        }
    }

    /// Set link lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Link lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Upload `media` under its object key, then sign a GET URL for it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the upload or the signing fails. No retry is
    /// attempted.
    pub async fn deliver(&self, media: &ExtractedMedia) -> Result<SignedLink, StorageError> {
        let key = ObjectKey::for_media(media);

        let bytes = self
            .store
            .put_object(&key, media.path(), &media.mime_type)
            .await?;

        let link = self.store.presign_get(&key, self.ttl).await?;

        info!(
            bucket = self.store.bucket(),
            object_key = %key,
            bytes,
            expires_in_secs = link.expires_in_secs,
            "Signed link issued"
        );
        Ok(link)
    }
}
