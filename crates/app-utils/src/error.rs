// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use core_policy::PolicyError;
use std::path::PathBuf;
use thiserror::Error;

/// Main errors of the `app-utils` crate
#[derive(Error, Debug)]
pub enum Error {
    /// A file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing failed
    #[error("YAML parsing failed: {0}")]
    YamlParseError(String),

    /// TOML parsing failed
    #[error("TOML parsing failed: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// The grant document is invalid
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Invalid setting value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed
    #[error("Tracing initialisation failed: {0}")]
    Telemetry(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
