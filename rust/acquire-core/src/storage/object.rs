// rust/acquire-core/src/storage/object.rs

//! Remote storage backed by the `object_store` crate.
//!
//! The pipeline is single-threaded and blocking, so uploads are driven to
//! completion on a private current-thread tokio runtime. Any `ObjectStore`
//! works; `ObjectStoreRemote::s3` builds the AWS client used in production.

use std::sync::Arc;

use bytes::Bytes;
use object_store::{ObjectStore, PutPayload};
use tokio::runtime::{Builder, Runtime};

use super::traits::RemoteStore;
#[cfg(feature = "s3")]
use crate::config::CloudConfig;
use crate::error::{AcquireError, Result};

/// Object store remote with a fixed key prefix.
pub struct ObjectStoreRemote {
    /// The underlying object store client.
    store: Arc<dyn ObjectStore>,
    /// Scheme and bucket, used only for log lines.
    display_root: String,
    /// Base prefix for all keys.
    base_prefix: String,
    runtime: Runtime,
}

impl ObjectStoreRemote {
    /// Wraps an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime driving uploads cannot be started.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        display_root: impl Into<String>,
        base_prefix: impl Into<String>,
    ) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AcquireError::config_with_source("failed to start upload runtime", e))?;

        Ok(Self {
            store,
            display_root: display_root.into(),
            base_prefix: base_prefix.into(),
            runtime,
        })
    }

    /// Builds an S3 client from configuration. Credentials come from the
    /// standard `AWS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the S3 client cannot be configured.
    #[cfg(feature = "s3")]
    pub fn s3(config: &CloudConfig) -> Result<Self> {
        use object_store::aws::AmazonS3Builder;

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        // Set endpoint if provided (for MinIO, LocalStack, etc.)
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| AcquireError::config_with_source("failed to build S3 client", e))?;

        Self::new(
            Arc::new(store),
            format!("s3://{}", config.bucket),
            config.prefix.clone(),
        )
    }

    /// Resolves a key to an object_store path with the base prefix.
    fn resolve_path(&self, key: &str) -> object_store::path::Path {
        object_store::path::Path::from(join_key(&self.base_prefix, key))
    }
}

/// Joins prefix and key with a single `/`, skipping empty segments.
pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}/{key}")
    }
}

impl RemoteStore for ObjectStoreRemote {
    fn put(&self, key: &str, body: Bytes) -> Result<()> {
        let location = self.resolve_path(key);
        self.runtime
            .block_on(self.store.put(&location, PutPayload::from_bytes(body)))
            .map_err(|e| AcquireError::upload(location.to_string(), e.to_string()))?;
        Ok(())
    }

    fn describe(&self, key: &str) -> String {
        format!("{}/{}", self.display_root, self.resolve_path(key))
    }
}
