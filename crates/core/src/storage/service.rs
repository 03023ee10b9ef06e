//! Storage gateway implementation using Apache OpenDAL.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use audiodrop_shared::StorageSettings;
use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use opendal::{Operator, Writer, services};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::error::StorageError;
use super::key::ObjectKey;

/// Bytes read from the source file per write call.
const READ_CHUNK_SIZE: usize = 256 * 1024;

/// Part size handed to OpenDAL for multipart uploads.
const UPLOAD_PART_SIZE: usize = 8 * 1024 * 1024;

/// A time-limited retrieval URL. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    /// The presigned URL.
    pub url: String,
    /// Lifetime of the URL in seconds.
    pub expires_in_secs: u64,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

impl SignedLink {
    /// Create a link valid for `ttl` from now.
    ///
    /// An expiry beyond the representable range saturates.
    #[must_use]
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            url: url.into(),
            expires_in_secs: ttl.as_secs(),
            expires_at,
        }
    }
}

/// Two-operation contract the delivery layer needs from object storage.
///
/// Implementations are shared by all requests and must be safe for
/// concurrent use.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket objects are written to.
    fn bucket(&self) -> &str;

    /// Upload the file at `path` under `key`. Returns the number of bytes written.
    async fn put_object(
        &self,
        key: &ObjectKey,
        path: &Path,
        content_type: &str,
    ) -> Result<u64, StorageError>;

    /// Issue a signed GET URL for `key`, valid for `ttl`.
    async fn presign_get(&self, key: &ObjectKey, ttl: Duration) -> Result<SignedLink, StorageError>;
}

/// S3-compatible object storage (Cloudflare R2, AWS S3, MinIO) backed by an
/// OpenDAL operator.
pub struct StorageService {
    operator: Operator,
    bucket: String,
    link_ttl: Duration,
}

impl StorageService {
    /// Create a new storage service from settings.
    ///
    /// No request is made; credentials are first used on upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built from the settings.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let operator = Self::create_operator(settings)?;
        Ok(Self {
            operator,
            bucket: settings.bucket.clone(),
            link_ttl: Duration::from_secs(settings.link_ttl_secs),
        })
    }

    /// Create OpenDAL operator for an S3-compatible endpoint.
    fn create_operator(settings: &StorageSettings) -> Result<Operator, StorageError> {
        let builder = services::S3::default()
            .endpoint(&settings.endpoint)
            .bucket(&settings.bucket)
            .access_key_id(&settings.access_key_id)
            .secret_access_key(&settings.secret_access_key)
            .region(&settings.region);

        Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish()
            .pipe(Ok)
    }

    /// Link lifetime from settings.
    #[must_use]
    pub fn link_ttl(&self) -> Duration {
        self.link_ttl
    }
}

/// Stream a local file into an OpenDAL writer.
async fn copy_file(path: &Path, writer: &mut Writer) -> Result<u64, StorageError> {
    let file = tokio::fs::File::open(path).await?;
    let mut chunks = ReaderStream::with_capacity(file, READ_CHUNK_SIZE);
    let mut written = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        writer.write(chunk).await?;
    }

    Ok(written)
}

#[async_trait]
impl ObjectStore for StorageService {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &ObjectKey,
        path: &Path,
        content_type: &str,
    ) -> Result<u64, StorageError> {
        let mut request = self
            .operator
            .writer_with(key.as_str())
            .chunk(UPLOAD_PART_SIZE);
        if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            request = request.content_type(content_type);
        }
        let mut writer = request.await?;

        let written = match copy_file(path, &mut writer).await {
            Ok(written) => written,
            Err(e) => {
                // Leave no half-finished multipart upload behind.
                let _ = writer.abort().await;
                return Err(e);
            }
        };
        writer.close().await?;

        debug!(
            bucket = %self.bucket,
            object_key = %key,
            bytes = written,
            "Object uploaded"
        );
        Ok(written)
    }

    async fn presign_get(&self, key: &ObjectKey, ttl: Duration) -> Result<SignedLink, StorageError> {
        let presigned = self
            .operator
            .presign_read(key.as_str(), ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(SignedLink::new(presigned.uri().to_string(), ttl))
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
