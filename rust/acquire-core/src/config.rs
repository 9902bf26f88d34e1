// rust/acquire-core/src/config.rs

//! Configuration management for dataset acquisition.
//!
//! This module provides configuration parsing from YAML files, environment
//! variable overrides, command-line overrides, and validation of the global
//! settings. Per-dataset settings are kept lenient here and validated by the
//! handler that processes the dataset.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AcquireError, Result};

/// Default endpoint of the dataset hub rows API.
pub const DEFAULT_HUB_ENDPOINT: &str = "https://datasets-server.huggingface.co";

/// The rows API refuses pages larger than this.
pub const MAX_HUB_PAGE_SIZE: usize = 100;

// Top-level acquisition configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireConfig {
    pub mode: RunMode,
    pub storage: StorageConfig,
    #[serde(alias = "aws")]
    pub cloud: CloudConfig,
    pub hub: HubConfig,
    /// Datasets in declared order.
    pub datasets: IndexMap<String, DatasetConfig>,
}

/// Whether truncation policies are active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Per-dataset `test_limit` applies.
    #[default]
    Test,
    /// Every dataset is streamed in full.
    Full,
}

/// Where shards are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Local filesystem only.
    #[default]
    Local,
    /// Object store only.
    S3,
    /// Local filesystem first, then object store.
    Both,
}

impl StorageMode {
    pub fn writes_local(self) -> bool {
        matches!(self, StorageMode::Local | StorageMode::Both)
    }

    pub fn writes_cloud(self) -> bool {
        matches!(self, StorageMode::S3 | StorageMode::Both)
    }
}

impl FromStr for RunMode {
    type Err = AcquireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "test" => Ok(RunMode::Test),
            "full" => Ok(RunMode::Full),
            other => Err(AcquireError::config(format!(
                "unknown run mode '{other}' (expected test or full)"
            ))),
        }
    }
}

impl FromStr for StorageMode {
    type Err = AcquireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "s3" => Ok(StorageMode::S3),
            "both" => Ok(StorageMode::Both),
            other => Err(AcquireError::config(format!(
                "unknown storage mode '{other}' (expected local, s3 or both)"
            ))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Test => f.write_str("test"),
            RunMode::Full => f.write_str("full"),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local => f.write_str("local"),
            StorageMode::S3 => f.write_str("s3"),
            StorageMode::Both => f.write_str("both"),
        }
    }
}

// Local storage options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage mode: "local", "s3" or "both".
    pub mode: StorageMode,
    // Root directory for local shards.
    pub local_dir: PathBuf,
    // Buffer size in bytes for local writes.
    pub buffer_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Local,
            local_dir: PathBuf::from("./data"),
            buffer_size: 64 * 1024, // 64 KB
        }
    }
}

/// Object store (S3-compatible) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Bucket name.
    #[serde(alias = "s3_bucket")]
    pub bucket: String,
    /// Key prefix prepended to every shard key.
    #[serde(alias = "s3_prefix")]
    pub prefix: String,
    /// AWS region (e.g., "us-east-1").
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Whether to allow HTTP (non-TLS) connections.
    pub allow_http: bool,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            allow_http: false,
        }
    }
}

/// Dataset hub (rows API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub endpoint: String,
    /// Rows fetched per request.
    pub page_size: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            page_size: MAX_HUB_PAGE_SIZE,
        }
    }
}

/// Settings for one dataset entry.
///
/// Every field is optional at parse time; which ones are required depends on
/// the handler chosen for the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub repo: Option<String>,
    pub subset: Option<String>,
    pub name: Option<String>,
    pub split: Option<String>,
    pub languages: Option<Vec<String>>,
    pub test_limit: Option<LimitConfig>,
    pub local_path: Option<String>,
    #[serde(alias = "s3_path")]
    pub cloud_path: Option<String>,
}

/// Raw `test_limit` block as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitConfig {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Command-line overrides. `None` leaves the configured value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub storage_mode: Option<StorageMode>,
    pub run_mode: Option<RunMode>,
}

impl FromStr for AcquireConfig {
    type Err = AcquireError;

    /// Parse configuration from a YAML string.
    fn from_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s)
            .map_err(|e| AcquireError::config_with_source("failed to parse YAML config", e))
    }
}

impl AcquireConfig {
    // Load configuration from a YAML file.
    //
    // A missing file is a configuration error; nothing is validated yet
    // because overrides may still supply required values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AcquireError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            AcquireError::config_with_source(
                format!("failed to read config file {}", path.display()),
                e,
            )
        })?;
        content.parse()
    }

    // Apply environment variable overrides.
    //
    // Variables are prefixed with `ACQ_`:
    // - `ACQ_MODE` overrides `mode` ("test" or "full")
    // - `ACQ_STORAGE_MODE` overrides `storage.mode`
    // - `ACQ_LOCAL_DIR` overrides `storage.local_dir`
    // - `ACQ_CLOUD_BUCKET` / `ACQ_CLOUD_PREFIX` / `ACQ_CLOUD_REGION` / `ACQ_CLOUD_ENDPOINT`
    // - `ACQ_HUB_ENDPOINT` / `ACQ_HUB_PAGE_SIZE`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("ACQ_MODE") {
            if let Ok(mode) = val.parse() {
                self.mode = mode;
            }
        }
        if let Ok(val) = std::env::var("ACQ_STORAGE_MODE") {
            if let Ok(mode) = val.parse() {
                self.storage.mode = mode;
            }
        }
        if let Ok(val) = std::env::var("ACQ_LOCAL_DIR") {
            self.storage.local_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("ACQ_CLOUD_BUCKET") {
            self.cloud.bucket = val;
        }
        if let Ok(val) = std::env::var("ACQ_CLOUD_PREFIX") {
            self.cloud.prefix = val;
        }
        if let Ok(val) = std::env::var("ACQ_CLOUD_REGION") {
            self.cloud.region = val;
        }
        if let Ok(val) = std::env::var("ACQ_CLOUD_ENDPOINT") {
            self.cloud.endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("ACQ_HUB_ENDPOINT") {
            self.hub.endpoint = val;
        }
        if let Ok(val) = std::env::var("ACQ_HUB_PAGE_SIZE") {
            if let Ok(v) = val.parse() {
                self.hub.page_size = v;
            }
        }

        self
    }

    /// Apply command-line overrides, logging each one that takes effect.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(bucket) = &overrides.bucket {
            tracing::info!(bucket = %bucket, "using cloud bucket from command line");
            self.cloud.bucket = bucket.clone();
        }
        if let Some(region) = &overrides.region {
            tracing::info!(region = %region, "using cloud region from command line");
            self.cloud.region = region.clone();
        }
        if let Some(mode) = overrides.storage_mode {
            tracing::info!(storage = %mode, "using storage mode from command line");
            self.storage.mode = mode;
        }
        if let Some(mode) = overrides.run_mode {
            tracing::info!(mode = %mode, "using run mode from command line");
            self.mode = mode;
        }
    }

    // Validate the global settings.
    //
    // Dataset entries are not checked here; a malformed entry only fails
    // its own dataset.
    pub fn validate(&self) -> Result<()> {
        if self.storage.mode.writes_cloud() && self.cloud.bucket.trim().is_empty() {
            return Err(AcquireError::config(format!(
                "cloud.bucket must not be empty when storage mode is '{}'",
                self.storage.mode
            )));
        }

        if self.storage.mode.writes_local() && self.storage.local_dir.as_os_str().is_empty() {
            return Err(AcquireError::config(
                "storage.local_dir must not be empty for local storage",
            ));
        }

        if self.storage.buffer_size == 0 {
            return Err(AcquireError::config(
                "storage.buffer_size must be greater than 0",
            ));
        }

        if self.hub.page_size == 0 || self.hub.page_size > MAX_HUB_PAGE_SIZE {
            return Err(AcquireError::config(format!(
                "hub.page_size must be between 1 and {MAX_HUB_PAGE_SIZE}"
            )));
        }

        Ok(())
    }
}
