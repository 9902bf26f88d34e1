// rust/acquire-core/src/storage/sink.rs

//! Shard sink that fans out to local disk, object storage, or both.

use std::io::Write;

use bytes::Bytes;

use super::local::LocalStorage;
use super::traits::{RemoteStore, ShardLocation, ShardSink};
use crate::config::{AcquireConfig, StorageMode};
use crate::dataset::Record;
use crate::error::{AcquireError, Result};

/// Persists shards as newline-delimited JSON according to the storage mode.
///
/// For `both`, the local file is written before the upload starts; an upload
/// failure leaves the local file in place.
pub struct StorageSink {
    mode: StorageMode,
    local: Option<LocalStorage>,
    remote: Option<Box<dyn RemoteStore>>,
}

impl StorageSink {
    /// Assembles a sink from already-built backends.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the mode needs a backend that was not
    /// supplied.
    pub fn new(
        mode: StorageMode,
        local: Option<LocalStorage>,
        remote: Option<Box<dyn RemoteStore>>,
    ) -> Result<Self> {
        if mode.writes_local() && local.is_none() {
            return Err(AcquireError::config(format!(
                "storage mode '{mode}' requires local storage"
            )));
        }
        if mode.writes_cloud() && remote.is_none() {
            return Err(AcquireError::config(format!(
                "storage mode '{mode}' requires a cloud store"
            )));
        }
        Ok(Self { mode, local, remote })
    }

    /// Builds the backends the configured storage mode needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the local root cannot be created or the cloud
    /// client cannot be configured.
    pub fn from_config(config: &AcquireConfig) -> Result<Self> {
        let mode = config.storage.mode;

        let local = if mode.writes_local() {
            Some(LocalStorage::new(&config.storage)?)
        } else {
            None
        };

        let remote: Option<Box<dyn RemoteStore>> = if mode.writes_cloud() {
            Some(Box::new(build_remote(config)?))
        } else {
            None
        };

        Self::new(mode, local, remote)
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    fn write_local(&self, local: &LocalStorage, lines: &[String], location: &ShardLocation) -> Result<()> {
        let path = local.resolve_path(&location.local_path);
        let mut writer = local.open_write(&location.local_path)?;
        for line in lines {
            writeln!(writer, "{line}")
                .map_err(|e| AcquireError::storage_with_source(&path, "failed to write record", e))?;
        }
        writer.finish()?;
        tracing::info!(path = %path.display(), records = lines.len(), "saved shard");
        Ok(())
    }

    fn upload(&self, remote: &dyn RemoteStore, lines: &[String], location: &ShardLocation) -> Result<()> {
        let body = Bytes::from(lines.join("\n"));
        remote.put(&location.cloud_key, body)?;
        tracing::info!(
            object = %remote.describe(&location.cloud_key),
            records = lines.len(),
            "uploaded shard"
        );
        Ok(())
    }
}

#[cfg(feature = "s3")]
fn build_remote(config: &AcquireConfig) -> Result<super::ObjectStoreRemote> {
    super::ObjectStoreRemote::s3(&config.cloud)
}

#[cfg(not(feature = "s3"))]
fn build_remote(_config: &AcquireConfig) -> Result<super::ObjectStoreRemote> {
    Err(AcquireError::config(
        "cloud storage requested but this build has no s3 support",
    ))
}

/// Serializes one record as a JSON line body, keeping non-ASCII text as-is.
pub fn encode_record(record: &Record) -> Result<String> {
    serde_json::to_string(record).map_err(|e| AcquireError::serialization(e.to_string()))
}

impl ShardSink for StorageSink {
    fn persist(&self, records: &[Record], location: &ShardLocation) -> Result<()> {
        let lines = records
            .iter()
            .map(encode_record)
            .collect::<Result<Vec<_>>>()?;

        if self.mode.writes_local() {
            if let Some(local) = &self.local {
                self.write_local(local, &lines, location)?;
            }
        }

        if self.mode.writes_cloud() {
            if let Some(remote) = &self.remote {
                self.upload(remote.as_ref(), &lines, location)?;
            }
        }

        Ok(())
    }
}
