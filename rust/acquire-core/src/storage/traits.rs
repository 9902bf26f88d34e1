// rust/acquire-core/src/storage/traits.rs

//! Storage abstraction traits for shard persistence.
//!
//! Local files and remote objects are written through separate seams so a
//! sink can target either or both, and tests can substitute either side.

use std::io::Write;
use std::path::PathBuf;

use bytes::Bytes;

use crate::dataset::Record;
use crate::error::Result;

/// A handle for writing to local storage.
///
/// This trait extends `Write` with a method to finalize the write operation.
pub trait StorageWriter: Write {
    /// Finishes the write operation, ensuring all data is persisted.
    ///
    /// This method must be called to complete the write. After calling
    /// `finish`, the writer should not be used again.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or syncing the file fails.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// A remote object store that accepts whole-object uploads.
///
/// Keys are relative to whatever prefix the implementation was built with.
pub trait RemoteStore {
    /// Uploads `body` as a single object at `key`, replacing any existing
    /// object.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails. No retry is attempted.
    fn put(&self, key: &str, body: Bytes) -> Result<()>;

    /// Human-readable location of `key`, e.g. `s3://bucket/prefix/key`.
    fn describe(&self, key: &str) -> String;
}

/// Where one shard lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLocation {
    /// Path relative to the local storage root.
    pub local_path: PathBuf,
    /// Key relative to the remote prefix.
    pub cloud_key: String,
}

/// Destination for finished shards.
pub trait ShardSink {
    /// Persists one shard of records.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the local write or the upload
    /// fails. Shards persisted earlier are left in place.
    fn persist(&self, records: &[Record], location: &ShardLocation) -> Result<()>;
}
