// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Engine settings
//!
//! # Load Order
//!
//! 1. Default values
//! 2. Settings file (`warden.toml`), if given
//! 3. Environment variables (`WARDEN_*`)
//!
//! Each layer overrides the previous.
//!
//! ```toml
//! [features]
//! manage_permission = true
//! system_read_permission = false
//!
//! [authorization]
//! strategy = "grant-table"
//! allow_anonymous_read = false
//!
//! [log]
//! filter = "warn,core_policy=debug"
//! ```

use crate::error::{Error, Result};
use core_policy::catalog::CatalogFlags;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Enables `Overall/Manage`
pub const ENV_MANAGE_PERMISSION: &str = "WARDEN_MANAGE_PERMISSION";
/// Enables `Overall/SystemRead`
pub const ENV_SYSTEM_READ_PERMISSION: &str = "WARDEN_SYSTEM_READ_PERMISSION";
/// Default log filter directive
pub const ENV_LOG: &str = "WARDEN_LOG";

/// Default log filter when nothing else is configured
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Deployment feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureSettings {
    /// Enable the `Overall/Manage` permission
    pub manage_permission: bool,
    /// Enable the `Overall/SystemRead` permission
    pub system_read_permission: bool,
}

/// Which authorization strategy the engine installs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Decisions come from the grant table
    #[default]
    GrantTable,
    /// Everything is allowed
    Unsecured,
    /// Any authenticated principal holds every permission
    FullControlOnceLoggedIn,
}

/// Strategy selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizationSettings {
    /// Installed strategy
    pub strategy: StrategyKind,
    /// With `full-control-once-logged-in`, let anonymous principals read
    pub allow_anonymous_read: bool,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Complete engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Feature flags
    pub features: FeatureSettings,
    /// Strategy selection
    pub authorization: AuthorizationSettings,
    /// Logging
    pub log: LogSettings,
}

impl EngineSettings {
    /// Parse settings from TOML
    ///
    /// # Errors
    ///
    /// `TomlParseError` for malformed input or unknown keys
    pub fn from_toml(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load defaults, then `path` if given, then the process environment
    ///
    /// # Errors
    ///
    /// `Io` if `path` cannot be read, `TomlParseError` if it is malformed,
    /// `Config` for unparseable environment values
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                let settings = Self::from_toml(&content)?;
                tracing::debug!(path = %path.display(), "settings file loaded");
                settings
            }
            None => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Apply `WARDEN_*` overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// `Config` if a boolean variable holds something other than
    /// true/false/1/0/yes/no/on/off
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MANAGE_PERMISSION) {
            self.features.manage_permission = parse_env_bool(ENV_MANAGE_PERMISSION, &value)?;
        }
        if let Some(value) = lookup(ENV_SYSTEM_READ_PERMISSION) {
            self.features.system_read_permission =
                parse_env_bool(ENV_SYSTEM_READ_PERMISSION, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            self.log.filter = value;
        }
        Ok(())
    }

    /// Permission catalog flags for these settings
    #[must_use]
    pub const fn catalog_flags(&self) -> CatalogFlags {
        CatalogFlags {
            manage_permission: self.features.manage_permission,
            system_read_permission: self.features.system_read_permission,
        }
    }
}

fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{name}: expected a boolean, got {value:?}"
        ))),
    }
}
