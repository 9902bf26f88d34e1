// rust/acquire-core/src/error.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquireError {

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to open stream '{repo}' (split '{split}'): {message}")]
    SourceOpen {
        repo: String,
        split: String,
        message: String,
    },

    #[error("Stream '{repo}' (split '{split}') failed mid-read: {message}")]
    Stream {
        repo: String,
        split: String,
        message: String,
    },

    #[error("Storage error at '{path}': {message}")]
    Storage {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Upload of '{key}' failed: {message}")]
    Upload {
        key: String,
        message: String,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, AcquireError>;

/// Coarse classification used when reporting a failed dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    SourceOpen,
    SinkWrite,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Config => "config",
            ErrorCategory::SourceOpen => "source-open",
            ErrorCategory::SinkWrite => "sink-write",
        };
        f.write_str(name)
    }
}

// Convenience constructors
impl AcquireError {

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn source_open(
        repo: impl Into<String>,
        split: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SourceOpen {
            repo: repo.into(),
            split: split.into(),
            message: message.into(),
        }
    }

    pub fn stream(
        repo: impl Into<String>,
        split: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Stream {
            repo: repo.into(),
            split: split.into(),
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn upload(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Config,
            Self::SourceOpen { .. } | Self::Stream { .. } => ErrorCategory::SourceOpen,
            Self::Storage { .. } | Self::Upload { .. } | Self::Serialization { .. } => {
                ErrorCategory::SinkWrite
            }
        }
    }
}
