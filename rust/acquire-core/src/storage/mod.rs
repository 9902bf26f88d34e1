// rust/acquire-core/src/storage/mod.rs

//! Storage for finished shards.
//!
//! Shards go to the local filesystem, to an object store, or to both, as
//! selected by the storage mode. The two backends sit behind small traits so
//! the sink can be driven against an in-memory store in tests.
//!
//! # Example
//!
//! ```no_run
//! use acquire_core::config::AcquireConfig;
//! use acquire_core::dataset::Record;
//! use acquire_core::storage::{ShardLocation, ShardSink, StorageSink};
//! use std::path::PathBuf;
//!
//! let config = AcquireConfig::default();
//! let sink = StorageSink::from_config(&config).unwrap();
//!
//! let mut record = Record::new();
//! record.insert("text".to_string(), "hello".into());
//!
//! sink.persist(
//!     &[record],
//!     &ShardLocation {
//!         local_path: PathBuf::from("demo/part-00000.jsonl"),
//!         cloud_key: "demo/part-00000.jsonl".to_string(),
//!     },
//! )
//! .unwrap();
//! ```

mod local;
mod object;
mod sink;
mod traits;

pub use local::LocalStorage;
pub use object::ObjectStoreRemote;
pub use sink::{encode_record, StorageSink};
pub use traits::{RemoteStore, ShardLocation, ShardSink, StorageWriter};
