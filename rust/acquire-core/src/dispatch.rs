// rust/acquire-core/src/dispatch.rs

//! Run orchestration across all configured datasets.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::AcquireConfig;
use crate::dataset::{RecordSource, SHARD_SIZE};
use crate::handlers::{DatasetReport, Handler, HandlerContext};
use crate::storage::ShardSink;

/// Runs every configured dataset in declaration order.
///
/// Each dataset is isolated: an error ends that dataset only and is recorded
/// in the summary, then the next dataset starts. Shards already written by a
/// failed dataset are left as they are.
pub struct Dispatcher<'a> {
    source: &'a dyn RecordSource,
    sink: &'a dyn ShardSink,
    shard_size: usize,
}

impl<'a> Dispatcher<'a> {
    pub fn new(source: &'a dyn RecordSource, sink: &'a dyn ShardSink) -> Self {
        Self {
            source,
            sink,
            shard_size: SHARD_SIZE,
        }
    }

    /// Overrides the records-per-shard constant.
    #[must_use]
    pub fn with_shard_size(mut self, shard_size: usize) -> Self {
        self.shard_size = shard_size;
        self
    }

    pub fn run(&self, config: &AcquireConfig) -> RunSummary {
        let ctx = HandlerContext {
            source: self.source,
            sink: self.sink,
            mode: config.mode,
            storage_mode: config.storage.mode,
            shard_size: self.shard_size,
        };

        let run_start = Instant::now();
        let mut outcomes = Vec::with_capacity(config.datasets.len());

        for (name, dataset) in &config.datasets {
            let handler = Handler::for_dataset(name);
            tracing::info!(dataset = %name, handler = %handler, "processing dataset");

            let start = Instant::now();
            let status = match handler.run(name, dataset, &ctx) {
                Ok(report) => {
                    let elapsed = start.elapsed();
                    tracing::info!(
                        dataset = %name,
                        elapsed_secs = elapsed.as_secs_f64(),
                        "dataset finished"
                    );
                    DatasetStatus::Succeeded { elapsed, report }
                }
                Err(e) => {
                    tracing::error!(
                        dataset = %name,
                        category = %e.category(),
                        error = %e,
                        "dataset failed"
                    );
                    DatasetStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };

            outcomes.push(DatasetOutcome {
                name: name.clone(),
                status,
            });
        }

        RunSummary {
            outcomes,
            elapsed: run_start.elapsed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetStatus {
    Succeeded {
        elapsed: Duration,
        report: DatasetReport,
    },
    /// The dataset stopped on an error. The message is what was logged at
    /// the point of failure.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOutcome {
    pub name: String,
    pub status: DatasetStatus,
}

impl DatasetOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, DatasetStatus::Succeeded { .. })
    }
}

/// Result of one run, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<DatasetOutcome>,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Names of the datasets that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn outcome(&self, name: &str) -> Option<&DatasetOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary")?;
        for outcome in &self.outcomes {
            match &outcome.status {
                DatasetStatus::Succeeded { elapsed, report } => writeln!(
                    f,
                    "  ok      {}: {:.2}s ({} records, {} shards)",
                    outcome.name,
                    elapsed.as_secs_f64(),
                    report.total_records(),
                    report.total_shards()
                )?,
                DatasetStatus::Failed { .. } => {
                    writeln!(f, "  failed  {}: Failed", outcome.name)?
                }
            }
        }
        write!(f, "Total time: {:.2}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageMode;
    use crate::storage::{LocalStorage, StorageSink};
    use crate::testing::{record_id, FlakyRemote, RecordingSink, ScriptedSource};
    use std::path::Path;
    use tempfile::TempDir;

    fn config(yaml: &str) -> AcquireConfig {
        yaml.parse().unwrap()
    }

    fn read_ids(path: &Path) -> Vec<u64> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| record_id(&serde_json::from_str(line).unwrap()))
            .collect()
    }

    fn shard_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_rows_limit_writes_single_shard() {
        let temp = TempDir::new().unwrap();
        let local = LocalStorage::with_base_path(temp.path(), 4096).unwrap();
        let sink = StorageSink::new(StorageMode::Local, Some(local), None).unwrap();
        let source = ScriptedSource::default().with_stream("org/d1", "train", 5);
        let config = config(
            r#"
mode: test
datasets:
  d1:
    repo: org/d1
    test_limit: {type: rows, value: 3}
    local_path: d1
"#,
        );

        let summary = Dispatcher::new(&source, &sink).run(&config);

        assert!(summary.failed().is_empty());
        let dir = temp.path().join("d1");
        assert_eq!(shard_files(&dir), vec!["part-00000.jsonl"]);
        assert_eq!(read_ids(&dir.join("part-00000.jsonl")), vec![0, 1, 2]);
    }

    #[test]
    fn test_languages_shard_independently() {
        let temp = TempDir::new().unwrap();
        let local = LocalStorage::with_base_path(temp.path(), 1 << 16).unwrap();
        let sink = StorageSink::new(StorageMode::Local, Some(local), None).unwrap();
        let source = ScriptedSource::default()
            .with_stream("org/d2", "en", 12_000)
            .with_stream("org/d2", "fr", 12_000);
        let config = config(
            r#"
mode: full
datasets:
  d2:
    repo: org/d2
    languages: [en, fr]
    local_path: d2
"#,
        );

        let summary = Dispatcher::new(&source, &sink).run(&config);
        assert!(summary.failed().is_empty());

        for language in ["en", "fr"] {
            let dir = temp.path().join("d2").join(language);
            assert_eq!(shard_files(&dir), vec!["part-00000.jsonl", "part-00001.jsonl"]);
            assert_eq!(read_ids(&dir.join("part-00000.jsonl")).len(), 10_000);
            let tail = read_ids(&dir.join("part-00001.jsonl"));
            assert_eq!(tail.len(), 2_000);
            assert_eq!(tail[0], 10_000);
        }

        match &summary.outcome("d2").unwrap().status {
            DatasetStatus::Succeeded { report, .. } => {
                assert_eq!(report.total_records(), 24_000);
                assert_eq!(report.total_shards(), 4);
                let languages: Vec<_> =
                    report.streams.iter().map(|s| s.language.as_deref()).collect();
                assert_eq!(languages, vec![Some("en"), Some("fr")]);
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_upload_failure_isolated_to_dataset() {
        let temp = TempDir::new().unwrap();
        let local = LocalStorage::with_base_path(temp.path(), 4096).unwrap();
        let remote = FlakyRemote::failing_at(1);
        let objects = remote.objects();
        let sink = StorageSink::new(StorageMode::Both, Some(local), Some(Box::new(remote))).unwrap();
        let source = ScriptedSource::default()
            .with_stream("org/flaky", "train", 6)
            .with_stream("org/after", "train", 2);
        let config = config(
            r#"
mode: full
storage:
  mode: both
cloud:
  bucket: test-bucket
datasets:
  flaky:
    repo: org/flaky
    local_path: flaky
    cloud_path: flaky
  after:
    repo: org/after
    local_path: after
    cloud_path: after
"#,
        );

        let summary = Dispatcher::new(&source, &sink).with_shard_size(3).run(&config);

        assert_eq!(summary.failed(), vec!["flaky"]);
        assert!(summary.outcome("after").unwrap().succeeded());

        let objects = objects.borrow();
        assert!(objects.contains_key("flaky/part-00000.jsonl"));
        assert!(!objects.contains_key("flaky/part-00001.jsonl"));
        assert!(objects.contains_key("after/part-00000.jsonl"));
        assert!(temp.path().join("flaky/part-00000.jsonl").exists());
        assert!(temp.path().join("after/part-00000.jsonl").exists());
    }

    #[test]
    fn test_unknown_name_uses_generic_handler() {
        let source = ScriptedSource::default().with_stream("allenai/dolma", "v1_7", 4);
        let sink = RecordingSink::default();
        let config = config(
            r#"
datasets:
  dolma:
    repo: allenai/dolma
    name: v1_7-sample
    split: v1_7
    local_path: dolma
"#,
        );

        let summary = Dispatcher::new(&source, &sink).run(&config);

        assert!(summary.failed().is_empty());
        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].config.as_deref(), Some("v1_7-sample"));
        assert_eq!(sink.shards().len(), 1);
    }

    #[test]
    fn test_datasets_run_in_declared_order() {
        let source = ScriptedSource::default()
            .with_stream("org/z", "train", 1)
            .with_stream("org/a", "train", 1)
            .with_stream("org/m", "train", 1);
        let sink = RecordingSink::default();
        let config = config(
            r#"
datasets:
  zeta: {repo: org/z, local_path: z}
  alpha: {repo: org/a, local_path: a}
  mid: {repo: org/m, local_path: m}
"#,
        );

        let summary = Dispatcher::new(&source, &sink).run(&config);

        let names: Vec<&str> = summary.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        let repos: Vec<String> = source.requests().into_iter().map(|r| r.repo).collect();
        assert_eq!(repos, vec!["org/z", "org/a", "org/m"]);
    }

    #[test]
    fn test_config_and_open_failures_do_not_stop_run() {
        let source = ScriptedSource::default().with_stream("org/ok", "train", 2);
        let sink = RecordingSink::default();
        let config = config(
            r#"
mode: test
datasets:
  bad_limit:
    repo: org/ok
    test_limit: {type: sample, value: 1}
    local_path: x
  sangraha:
    repo: ai4bharat/sangraha
    subset: verified
    languages: [hin]
    local_path: sangraha
  ok:
    repo: org/ok
    local_path: ok
"#,
        );

        let summary = Dispatcher::new(&source, &sink).run(&config);

        assert_eq!(summary.failed(), vec!["bad_limit", "sangraha"]);
        assert!(summary.outcome("ok").unwrap().succeeded());
        // The bad limit fails before its stream is opened.
        let repos: Vec<String> = source.requests().into_iter().map(|r| r.repo).collect();
        assert_eq!(repos, vec!["ai4bharat/sangraha", "org/ok"]);
        match &summary.outcome("sangraha").unwrap().status {
            DatasetStatus::Failed { message } => assert!(message.contains("sangraha")),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            outcomes: vec![
                DatasetOutcome {
                    name: "sangraha".to_string(),
                    status: DatasetStatus::Succeeded {
                        elapsed: Duration::from_millis(1_250),
                        report: DatasetReport::default(),
                    },
                },
                DatasetOutcome {
                    name: "dolma".to_string(),
                    status: DatasetStatus::Failed {
                        message: "boom".to_string(),
                    },
                },
            ],
            elapsed: Duration::from_secs(3),
        };

        let rendered = summary.to_string();
        assert!(rendered.contains("sangraha: 1.25s (0 records, 0 shards)"));
        assert!(rendered.contains("dolma: Failed"));
        assert!(rendered.ends_with("Total time: 3.00s"));
        assert_eq!(summary.failed(), vec!["dolma"]);
    }

    #[test]
    fn test_empty_config_yields_empty_summary() {
        let source = ScriptedSource::default();
        let sink = RecordingSink::default();
        let summary = Dispatcher::new(&source, &sink).run(&AcquireConfig::default());
        assert!(summary.outcomes.is_empty());
        assert!(summary.failed().is_empty());
    }
}
