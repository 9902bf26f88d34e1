// rust/acquire-core/src/dataset/traits.rs

use std::fmt;

use crate::error::Result;

/// One upstream record. The schema belongs to the dataset; key order is kept
/// as received.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A lazy, pull-based sequence of records. Not restartable: reopening the
/// source starts again from the first record.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record>>>;

/// What to open on the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// Dataset identifier, e.g. `ai4bharat/sangraha`.
    pub repo: String,
    /// Subset / config name, if the dataset has several.
    pub config: Option<String>,
    pub split: String,
}

impl StreamRequest {
    pub fn new(repo: impl Into<String>, config: Option<String>, split: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            config,
            split: split.into(),
        }
    }
}

impl fmt::Display for StreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.config {
            Some(config) => write!(f, "{}[{}]:{}", self.repo, config, self.split),
            None => write!(f, "{}:{}", self.repo, self.split),
        }
    }
}

/// A remote catalog that can stream records for a dataset split.
pub trait RecordSource {
    /// Opens a stream. Failures that can be detected up front (unknown
    /// dataset, missing split, auth) are returned here rather than from the
    /// first `next()`.
    fn open(&self, request: &StreamRequest) -> Result<RecordStream>;
}
