//! Error types for koala-trace.

use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

/// A navigation token that could not be turned into a request.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded token is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("token has no ':' separator between path and line")]
    MissingSeparator,

    #[error("token has an empty path")]
    EmptyPath,

    #[error("invalid line number '{0}' (lines are 1-based)")]
    InvalidLine(String),
}

/// Why a suggestion scan produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A newer debug session started while the scan was queued or running.
    #[error("scan cancelled by a newer debug session")]
    Cancelled,

    /// The scan worker shut down before answering.
    #[error("scan worker is no longer running")]
    WorkerGone,
}

/// Source tree enumeration failure.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Failure to load an explicitly requested configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure to load or run a session replay script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay script at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse replay script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("line numbers in replay scripts are 1-based, got 0 for {path}")]
    ZeroLine { path: String },
}
