// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Library error type

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised by the ingest pipeline and its configuration
///
/// Data-quality problems (malformed numstat lines, bad timezone tokens,
/// unreadable files during a scan, unresolved authors) are not errors: they
/// degrade to defaults and are logged.
#[derive(Debug, Error)]
pub enum Error {
    /// The log command could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The log command exited with a nonzero status
    #[error("log command failed ({status}): {stderr}")]
    CommandFailed {
        /// Exit status of the child process
        status: ExitStatus,
        /// Everything the child wrote to stderr
        stderr: String,
    },

    /// The log command did not finish in time
    #[error("log command timed out after {seconds}s")]
    Timeout {
        /// Configured timeout
        seconds: u64,
    },

    /// A category rule pattern does not compile
    #[error("invalid pattern {pattern:?} for category {category:?}: {source}")]
    InvalidPattern {
        /// Category label owning the pattern
        category: String,
        /// Offending pattern
        pattern: String,
        /// Regex compile error
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while talking to the child process
    #[error("I/O error reading log output: {0}")]
    Stream(#[from] std::io::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for repocensus operations
pub type Result<T> = std::result::Result<T, Error>;
