// rust/acquire-core/src/handlers.rs

//! Per-dataset acquisition handlers.
//!
//! A handler turns one dataset entry into a list of streams to open, then
//! runs each stream through the truncation policy and the shard writer.
//! Which handler runs is decided by the dataset's name alone.

use std::fmt;

use crate::config::{DatasetConfig, RunMode, StorageMode};
use crate::dataset::{
    apply_limit, resolve_limit, write_sharded, LimitSpec, RecordSource, ShardStats,
    ShardTarget, StreamRequest,
};
use crate::error::{AcquireError, Result};
use crate::storage::ShardSink;

/// Dataset name routed to the multi-language handler.
pub const MULTI_LANGUAGE_DATASET: &str = "sangraha";

/// Dataset name routed to the single-split handler.
pub const SINGLE_SPLIT_DATASET: &str = "indiccorp_v2";

const DEFAULT_SPLIT: &str = "train";

/// Handler variants, selected by dataset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// One stream per configured language; `subset` is the config and each
    /// language is a split.
    MultiLanguage,
    /// One stream from an explicit `name` and `split`.
    SingleSplit,
    /// Fallback for every other dataset. Accepts the loosest shape; only
    /// `name` selects the hub config, `subset` is ignored.
    Generic,
}

impl Handler {
    pub fn for_dataset(name: &str) -> Self {
        match name {
            MULTI_LANGUAGE_DATASET => Handler::MultiLanguage,
            SINGLE_SPLIT_DATASET => Handler::SingleSplit,
            _ => Handler::Generic,
        }
    }

    /// Validates `config` and lays out the streams to process.
    ///
    /// Nothing is opened here, so a malformed entry fails before any
    /// network or storage work happens.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing or invalid key.
    pub fn plan(
        &self,
        dataset: &str,
        config: &DatasetConfig,
        storage_mode: StorageMode,
    ) -> Result<DatasetPlan> {
        let fields = Fields { dataset, config };
        let repo = fields.required("repo", &config.repo)?;
        let limit = resolve_limit(config.test_limit.as_ref())?;
        let target = fields.target(storage_mode)?;

        let streams = match self {
            Handler::MultiLanguage => {
                let subset = fields.required("subset", &config.subset)?;
                let languages = fields.languages()?.ok_or_else(|| fields.missing("languages"))?;
                per_language(repo, Some(subset), languages, &target)
            }
            Handler::SingleSplit => {
                let name = fields.required("name", &config.name)?;
                let split = fields.required("split", &config.split)?;
                vec![PlannedStream {
                    language: None,
                    request: StreamRequest::new(repo, Some(name.to_string()), split),
                    target,
                }]
            }
            Handler::Generic => {
                let name = config.name.as_deref();
                match fields.languages()? {
                    Some(languages) => per_language(repo, name, languages, &target),
                    None => vec![PlannedStream {
                        language: None,
                        request: StreamRequest::new(
                            repo,
                            name.map(str::to_string),
                            config.split.as_deref().unwrap_or(DEFAULT_SPLIT),
                        ),
                        target,
                    }],
                }
            }
        };

        Ok(DatasetPlan { limit, streams })
    }

    /// Plans and processes one dataset entry.
    ///
    /// Streams run one after another. The first failure ends the dataset;
    /// streams after it are not opened and shards already written stay.
    ///
    /// # Errors
    ///
    /// Returns the configuration, source or sink error that stopped the
    /// dataset.
    pub fn run(
        &self,
        dataset: &str,
        config: &DatasetConfig,
        ctx: &HandlerContext<'_>,
    ) -> Result<DatasetReport> {
        let plan = self.plan(dataset, config, ctx.storage_mode)?;
        tracing::debug!(dataset, handler = %self, streams = plan.streams.len(), limit = ?plan.limit, "planned dataset");

        let mut report = DatasetReport::default();
        for stream in &plan.streams {
            if let Some(language) = &stream.language {
                tracing::info!(dataset, language = %language, "processing language");
            }

            let source = ctx.source.open(&stream.request)?;
            let limited = apply_limit(source, &plan.limit, ctx.mode);
            let stats = write_sharded(limited, ctx.shard_size, ctx.sink, &stream.target)?;

            tracing::info!(
                dataset,
                stream = %stream.request,
                records = stats.records,
                shards = stats.shards,
                "stream complete"
            );
            report.streams.push(StreamReport {
                language: stream.language.clone(),
                stats,
            });
        }

        tracing::info!(
            dataset,
            records = report.total_records(),
            shards = report.total_shards(),
            "dataset complete"
        );
        Ok(report)
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Handler::MultiLanguage => "multi-language",
            Handler::SingleSplit => "single-split",
            Handler::Generic => "generic",
        };
        f.write_str(name)
    }
}

fn per_language(
    repo: &str,
    subset: Option<&str>,
    languages: &[String],
    target: &ShardTarget,
) -> Vec<PlannedStream> {
    languages
        .iter()
        .map(|language| PlannedStream {
            language: Some(language.clone()),
            request: StreamRequest::new(repo, subset.map(str::to_string), language),
            target: target.child(language),
        })
        .collect()
}

/// Key lookups on one dataset entry with errors that name the dataset.
struct Fields<'a> {
    dataset: &'a str,
    config: &'a DatasetConfig,
}

impl<'a> Fields<'a> {
    fn missing(&self, key: &str) -> AcquireError {
        AcquireError::config(format!("dataset '{}' is missing '{key}'", self.dataset))
    }

    fn required<'v>(&self, key: &str, value: &'v Option<String>) -> Result<&'v str> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(self.missing(key)),
        }
    }

    fn languages(&self) -> Result<Option<&'a [String]>> {
        match self.config.languages.as_deref() {
            Some([]) => Err(AcquireError::config(format!(
                "dataset '{}' has an empty 'languages' list",
                self.dataset
            ))),
            Some(languages) if languages.iter().any(|l| l.trim().is_empty()) => {
                Err(AcquireError::config(format!(
                    "dataset '{}' has a blank entry in 'languages'",
                    self.dataset
                )))
            }
            other => Ok(other),
        }
    }

    fn target(&self, storage_mode: StorageMode) -> Result<ShardTarget> {
        let local = if storage_mode.writes_local() {
            self.required("local_path", &self.config.local_path)?
        } else {
            self.config.local_path.as_deref().unwrap_or_default()
        };
        let cloud = if storage_mode.writes_cloud() {
            self.required("cloud_path", &self.config.cloud_path)?
        } else {
            self.config.cloud_path.as_deref().unwrap_or_default()
        };
        Ok(ShardTarget::new(local, cloud.trim_matches('/')))
    }
}

/// Streams a handler will open for one dataset, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPlan {
    pub limit: LimitSpec,
    pub streams: Vec<PlannedStream>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStream {
    pub language: Option<String>,
    pub request: StreamRequest,
    pub target: ShardTarget,
}

/// Shared collaborators for every handler invocation in a run.
pub struct HandlerContext<'a> {
    pub source: &'a dyn RecordSource,
    pub sink: &'a dyn ShardSink,
    pub mode: RunMode,
    pub storage_mode: StorageMode,
    pub shard_size: usize,
}

/// Counts for one processed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub language: Option<String>,
    pub stats: ShardStats,
}

/// Counts for one processed dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetReport {
    pub streams: Vec<StreamReport>,
}

impl DatasetReport {
    pub fn total_records(&self) -> u64 {
        self.streams.iter().map(|s| s.stats.records).sum()
    }

    pub fn total_shards(&self) -> u64 {
        self.streams.iter().map(|s| u64::from(s.stats.shards)).sum()
    }
}
