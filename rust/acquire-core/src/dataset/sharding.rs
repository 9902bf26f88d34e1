// rust/acquire-core/src/dataset/sharding.rs

use std::path::PathBuf;

use crate::error::{AcquireError, Result};
use crate::storage::{ShardLocation, ShardSink};

use super::traits::Record;

/// Records per shard.
pub const SHARD_SIZE: usize = 10_000;

/// Cumulative record interval between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// File name of the shard with the given zero-based index.
pub fn shard_file_name(index: u32) -> String {
    format!("part-{index:05}.jsonl")
}

/// Output location of one (dataset, optional language) stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardTarget {
    /// Directory relative to the local storage root.
    pub local_subdir: PathBuf,
    /// Key prefix relative to the remote prefix.
    pub cloud_subdir: String,
}

impl ShardTarget {
    pub fn new(local_subdir: impl Into<PathBuf>, cloud_subdir: impl Into<String>) -> Self {
        Self {
            local_subdir: local_subdir.into(),
            cloud_subdir: cloud_subdir.into(),
        }
    }

    /// The same target one level deeper, e.g. per language.
    pub fn child(&self, segment: &str) -> Self {
        let cloud_subdir = if self.cloud_subdir.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", self.cloud_subdir.trim_end_matches('/'), segment)
        };
        Self {
            local_subdir: self.local_subdir.join(segment),
            cloud_subdir,
        }
    }

    pub fn location(&self, index: u32) -> ShardLocation {
        let file = shard_file_name(index);
        let cloud_key = if self.cloud_subdir.is_empty() {
            file.clone()
        } else {
            format!("{}/{}", self.cloud_subdir.trim_end_matches('/'), file)
        };
        ShardLocation {
            local_path: self.local_subdir.join(&file),
            cloud_key,
        }
    }
}

/// Totals for one sharded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShardStats {
    pub records: u64,
    pub shards: u32,
}

/// Consume `source`, persisting it through `sink` as sequentially numbered
/// shards of `shard_size` records.
///
/// Records keep source order within and across shards. The last shard may be
/// smaller; an empty source writes nothing. The first failed record or sink
/// write stops the stream and is returned; shards already persisted stay.
///
/// # Errors
///
/// Returns a configuration error if `shard_size` is zero, otherwise the first
/// stream or sink error.
pub fn write_sharded<I>(
    source: I,
    shard_size: usize,
    sink: &dyn ShardSink,
    target: &ShardTarget,
) -> Result<ShardStats>
where
    I: IntoIterator<Item = Result<Record>>,
{
    if shard_size == 0 {
        return Err(AcquireError::config("shard size must be greater than zero"));
    }

    let mut buffer: Vec<Record> = Vec::with_capacity(shard_size.min(SHARD_SIZE));
    let mut stats = ShardStats::default();

    for record in source {
        buffer.push(record?);
        stats.records += 1;

        if stats.records % PROGRESS_INTERVAL == 0 {
            tracing::info!(records = stats.records, "progress");
        }

        if buffer.len() >= shard_size {
            flush(&mut buffer, &mut stats, sink, target)?;
        }
    }

    if !buffer.is_empty() {
        flush(&mut buffer, &mut stats, sink, target)?;
    }

    Ok(stats)
}

fn flush(
    buffer: &mut Vec<Record>,
    stats: &mut ShardStats,
    sink: &dyn ShardSink,
    target: &ShardTarget,
) -> Result<()> {
    let location = target.location(stats.shards);
    tracing::debug!(shard = stats.shards, records = buffer.len(), "flushing shard");
    sink.persist(buffer, &location)?;
    buffer.clear();
    stats.shards += 1;
    Ok(())
}
