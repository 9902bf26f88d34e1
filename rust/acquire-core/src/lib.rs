// rust/acquire-core/src/lib.rs

//! Dataset Acquisition - Core Library
//!
//! This crate streams records from a remote dataset catalog, cuts test runs
//! down with per-dataset truncation limits, splits each stream into
//! fixed-size JSON Lines shards, and persists them to local disk, an object
//! store, or both. A dispatcher runs every configured dataset in turn and
//! isolates failures per dataset.
//!
//! # Example
//!
//! ```no_run
//! use acquire_core::{AcquireConfig, Dispatcher, HubSource, StorageSink};
//!
//! let config = AcquireConfig::from_file("config.yml")
//!     .unwrap()
//!     .with_env_overrides();
//! config.validate().unwrap();
//!
//! let source = HubSource::new(&config.hub).unwrap();
//! let sink = StorageSink::from_config(&config).unwrap();
//!
//! let summary = Dispatcher::new(&source, &sink).run(&config);
//! println!("{summary}");
//! ```

pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{AcquireConfig, ConfigOverrides, DatasetConfig, RunMode, StorageMode};
pub use error::{AcquireError, ErrorCategory, Result};
pub use storage::{LocalStorage, ObjectStoreRemote, RemoteStore, ShardSink, StorageSink};

pub mod dataset;
pub use dataset::{HubSource, LimitSpec, Record, RecordSource, StreamRequest};

pub mod handlers;
pub use handlers::{DatasetReport, Handler};

pub mod dispatch;
pub use dispatch::{DatasetOutcome, DatasetStatus, Dispatcher, RunSummary};

#[cfg(test)]
mod testing;
