// rust/acquire-core/src/dataset/mod.rs

//! Streaming sources, truncation and sharding.
//!
//! A [`RecordSource`] opens a lazy stream of records for one dataset split.
//! The stream is cut down by the truncation policy in test runs and then
//! split into fixed-size shards that are handed to a [`ShardSink`].
//!
//! # Example
//!
//! ```no_run
//! use acquire_core::config::{AcquireConfig, RunMode};
//! use acquire_core::dataset::{
//!     apply_limit, write_sharded, HubSource, LimitSpec, RecordSource, ShardTarget,
//!     StreamRequest, SHARD_SIZE,
//! };
//! use acquire_core::storage::StorageSink;
//!
//! let config = AcquireConfig::default();
//! let source = HubSource::new(&config.hub).unwrap();
//! let sink = StorageSink::from_config(&config).unwrap();
//!
//! let request = StreamRequest::new("allenai/dolma", None, "train");
//! let stream = source.open(&request).unwrap();
//! let limited = apply_limit(stream, &LimitSpec::Rows(100), RunMode::Test);
//!
//! let stats = write_sharded(limited, SHARD_SIZE, &sink, &ShardTarget::new("dolma", "dolma")).unwrap();
//! println!("{} records in {} shards", stats.records, stats.shards);
//! ```
//!
//! [`ShardSink`]: crate::storage::ShardSink

mod hub;
mod limit;
mod sharding;
mod traits;

pub use hub::HubSource;
pub use limit::{apply_limit, resolve_limit, LimitSpec, ASSUMED_CORPUS_SIZE};
pub use sharding::{shard_file_name, write_sharded, ShardStats, ShardTarget, PROGRESS_INTERVAL, SHARD_SIZE};
pub use traits::{Record, RecordSource, RecordStream, StreamRequest};
