// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! HTTP-style actions and the permission each one requires

use core_policy::catalog::{ADMINISTER, MANAGE, RUN_SCRIPTS, UPLOAD_PLUGINS};
use core_policy::PermissionId;
use std::fmt;
use std::str::FromStr;

/// An action reachable over HTTP
///
/// The target may be the root object or an object delegating to it, such as
/// the built-in computer (`computer/(master)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebAction {
    /// Render the global configuration form
    Configure,
    /// Submit the global configuration form
    ConfigSubmit,
    /// Dump the internal export table (diagnostics)
    DumpExportTable,
    /// Script console
    Script,
    /// Administrative monitors page
    AdministrativeMonitors,
    /// Disable a plugin from the plugin manager
    PluginManagerDisable,
    /// Upload a plugin archive
    PluginManagerUpload,
}

impl WebAction {
    /// Every action, in table order
    pub const ALL: [Self; 7] = [
        Self::Configure,
        Self::ConfigSubmit,
        Self::DumpExportTable,
        Self::Script,
        Self::AdministrativeMonitors,
        Self::PluginManagerDisable,
        Self::PluginManagerUpload,
    ];

    /// URL path relative to the target object
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::ConfigSubmit => "configSubmit",
            Self::DumpExportTable => "dumpExportTable",
            Self::Script => "script",
            Self::AdministrativeMonitors => "manage/administrativeMonitors",
            Self::PluginManagerDisable => "pluginManager/disable",
            Self::PluginManagerUpload => "pluginManager/upload",
        }
    }

    /// Permission required on the target resource
    #[must_use]
    pub const fn required_permission(self) -> PermissionId {
        match self {
            Self::Configure | Self::ConfigSubmit => MANAGE,
            Self::DumpExportTable | Self::AdministrativeMonitors | Self::PluginManagerDisable => {
                ADMINISTER
            }
            Self::Script => RUN_SCRIPTS,
            Self::PluginManagerUpload => UPLOAD_PLUGINS,
        }
    }
}

impl fmt::Display for WebAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for WebAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim_matches('/');
        Self::ALL
            .into_iter()
            .find(|action| action.path() == path)
            .ok_or_else(|| format!("Unknown action: {s}"))
    }
}
