// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # app-utils
//!
//! Non-core utilities around the decision engine:
//! - engine settings (TOML file plus `WARDEN_*` environment overrides)
//! - grant document parsers (TOML and YAML)
//! - tracing subscriber setup

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod telemetry;

pub mod parser {
    //! Grant document parsing and serialization
    use crate::error::{Error, Result};
    use core_policy::{GrantDocument, PolicyError};
    use serde::{Deserialize, Serialize};
    use std::path::Path;

    /// Trait for grant document parsers (extensible to other formats)
    pub trait GrantDocumentParser {
        /// Parse and validate a document
        fn parse(&self, input: &str) -> std::result::Result<GrantDocument, PolicyError>;
    }

    /// TOML parser implementation
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TomlParser;

    impl GrantDocumentParser for TomlParser {
        fn parse(&self, input: &str) -> std::result::Result<GrantDocument, PolicyError> {
            GrantDocument::from_toml(input)
        }
    }

    /// YAML parser implementation
    #[derive(Debug, Clone, Copy, Default)]
    pub struct YamlParser;

    impl GrantDocumentParser for YamlParser {
        fn parse(&self, input: &str) -> std::result::Result<GrantDocument, PolicyError> {
            let document: GrantDocument = from_yaml(input)
                .map_err(|e| PolicyError::SerializationError(e.to_string()))?;
            document.validate()?;
            Ok(document)
        }
    }

    /// Pick a parser from the file extension (`.yaml`/`.yml`, otherwise TOML)
    #[must_use]
    pub fn parser_for(path: &Path) -> Box<dyn GrantDocumentParser> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Box::new(YamlParser),
            _ => Box::new(TomlParser),
        }
    }

    /// Read and parse a grant document from disk
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Policy` if it does not parse or validate
    pub fn load_grant_document(path: &Path) -> Result<GrantDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let document = parser_for(path).parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            name = document.name(),
            entries = document.entry_count(),
            "grant document loaded"
        );
        Ok(document)
    }

    /// Serialize a value to YAML
    ///
    /// # Errors
    ///
    /// `YamlParseError` if serialization fails
    pub fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
        serde_yaml::to_string(value)
            .map_err(|e| Error::YamlParseError(format!("YAML serialization error: {}", e)))
    }

    /// Deserialize from YAML
    ///
    /// # Errors
    ///
    /// `YamlParseError` if the input does not match `T`
    pub fn from_yaml<'a, T: Deserialize<'a>>(input: &'a str) -> Result<T> {
        serde_yaml::from_str(input).map_err(|e| Error::YamlParseError(e.to_string()))
    }
}

/// Re-export commonly used types
pub use config::{EngineSettings, StrategyKind};
pub use error::{Error, Result};
pub use parser::{load_grant_document, GrantDocumentParser, TomlParser, YamlParser};
pub use telemetry::init_tracing;
