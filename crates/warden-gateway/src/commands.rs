// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Command-line actions
//!
//! A [`Command`] names the permission it needs; the gateway checks it and
//! only then calls [`Command::run`]. Commands never check permissions
//! themselves.

use crate::types::{CommandError, ExitCode};
use core_policy::catalog::ADMINISTER;
use core_policy::{PermissionId, PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An action invoked from the command line
pub trait Command: fmt::Debug {
    /// Command name, as typed by the user
    fn name(&self) -> &str;

    /// Permission the principal must hold on the target resource
    fn required_permission(&self) -> &PermissionId;

    /// Perform the action, returning a message for the caller
    ///
    /// # Errors
    ///
    /// A [`CommandError`] carrying the exit code to report
    fn run(&mut self) -> std::result::Result<String, CommandError>;
}

fn enabled_by_default() -> bool {
    true
}

/// State of one installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Whether the plugin is active
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Plugins this one needs
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

/// Installed plugins and their dependencies
///
/// ```toml
/// [plugins.credentials]
/// enabled = true
///
/// [plugins.git]
/// dependencies = ["credentials"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManager {
    #[serde(default)]
    plugins: BTreeMap<String, PluginRecord>,
}

impl PluginManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enabled plugin
    #[must_use]
    pub fn with_plugin<I, S>(mut self, name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins.insert(
            name.into(),
            PluginRecord {
                enabled: true,
                dependencies: dependencies.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Load plugin state from TOML
    ///
    /// # Errors
    ///
    /// `TomlError` for malformed input
    pub fn from_toml(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Serialize plugin state to TOML
    ///
    /// # Errors
    ///
    /// `SerializationError` if serialization fails
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Whether `name` is installed and enabled; `None` if not installed
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.plugins.get(name).map(|p| p.enabled)
    }

    /// Installed plugin names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Enabled plugins that depend on `name`
    #[must_use]
    pub fn enabled_dependents(&self, name: &str) -> Vec<&str> {
        self.plugins
            .iter()
            .filter(|(_, record)| record.enabled && record.dependencies.contains(name))
            .map(|(dependent, _)| dependent.as_str())
            .collect()
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(record) = self.plugins.get_mut(name) {
            record.enabled = enabled;
        }
    }

    /// `name` and everything it needs, transitively
    fn dependency_closure(&self, name: &str) -> std::result::Result<BTreeSet<String>, String> {
        let mut closure = BTreeSet::new();
        let mut pending = vec![name.to_string()];
        while let Some(current) = pending.pop() {
            if !closure.insert(current.clone()) {
                continue;
            }
            let record = self.plugins.get(&current).ok_or_else(|| current.clone())?;
            pending.extend(record.dependencies.iter().cloned());
        }
        Ok(closure)
    }
}

/// Per-plugin results of one batch, reported in argument order
#[derive(Debug, Default)]
struct BatchReport {
    lines: Vec<String>,
    first_failure: Option<ExitCode>,
}

impl BatchReport {
    fn ok(&mut self, line: String) {
        self.lines.push(line);
    }

    fn fail(&mut self, code: ExitCode, line: String) {
        self.lines.push(line);
        self.first_failure.get_or_insert(code);
    }

    fn finish(self) -> std::result::Result<String, CommandError> {
        let message = self.lines.join("\n");
        match self.first_failure {
            None => Ok(message),
            Some(code) => Err(CommandError::new(code, message)),
        }
    }
}

/// Disable plugins
///
/// A plugin is left enabled while any enabled plugin outside the batch
/// depends on it. Dependents named in the same batch are disabled first.
#[derive(Debug)]
pub struct DisablePluginCommand<'a> {
    manager: &'a mut PluginManager,
    plugins: Vec<String>,
}

impl<'a> DisablePluginCommand<'a> {
    /// Disable `plugins` in `manager`
    pub fn new<I, S>(manager: &'a mut PluginManager, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            manager,
            plugins: plugins.into_iter().map(Into::into).collect(),
        }
    }
}

impl Command for DisablePluginCommand<'_> {
    fn name(&self) -> &str {
        "disable-plugin"
    }

    fn required_permission(&self) -> &PermissionId {
        static REQUIRED: PermissionId = ADMINISTER;
        &REQUIRED
    }

    fn run(&mut self) -> std::result::Result<String, CommandError> {
        let mut pending: Vec<&str> = self
            .plugins
            .iter()
            .map(String::as_str)
            .filter(|name| self.manager.is_enabled(name) == Some(true))
            .collect();

        // Disable whatever has no enabled dependents left, until nothing moves
        loop {
            let before = pending.len();
            pending.retain(|name| {
                if self.manager.enabled_dependents(name).is_empty() {
                    self.manager.set_enabled(name, false);
                    false
                } else {
                    true
                }
            });
            if pending.len() == before {
                break;
            }
        }

        let mut report = BatchReport::default();
        for name in &self.plugins {
            match self.manager.is_enabled(name) {
                None => report.fail(ExitCode::NoSuchPlugin, format!("No such plugin: {name}")),
                Some(true) => {
                    let dependents = self.manager.enabled_dependents(name).join(", ");
                    report.fail(
                        ExitCode::UnmetDependency,
                        format!("{name} not disabled: required by enabled plugins {dependents}"),
                    );
                }
                Some(false) => report.ok(format!("{name} disabled")),
            }
        }
        report.finish()
    }
}

/// Enable plugins together with everything they depend on
#[derive(Debug)]
pub struct EnablePluginCommand<'a> {
    manager: &'a mut PluginManager,
    plugins: Vec<String>,
}

impl<'a> EnablePluginCommand<'a> {
    /// Enable `plugins` in `manager`
    pub fn new<I, S>(manager: &'a mut PluginManager, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            manager,
            plugins: plugins.into_iter().map(Into::into).collect(),
        }
    }
}

impl Command for EnablePluginCommand<'_> {
    fn name(&self) -> &str {
        "enable-plugin"
    }

    fn required_permission(&self) -> &PermissionId {
        static REQUIRED: PermissionId = ADMINISTER;
        &REQUIRED
    }

    fn run(&mut self) -> std::result::Result<String, CommandError> {
        let mut report = BatchReport::default();
        for name in &self.plugins {
            if self.manager.is_enabled(name).is_none() {
                report.fail(ExitCode::NoSuchPlugin, format!("No such plugin: {name}"));
                continue;
            }
            match self.manager.dependency_closure(name) {
                Ok(closure) => {
                    for plugin in &closure {
                        self.manager.set_enabled(plugin, true);
                    }
                    report.ok(format!("{name} enabled"));
                }
                Err(missing) => report.fail(
                    ExitCode::UnmetDependency,
                    format!("{name} not enabled: missing dependency {missing}"),
                ),
            }
        }
        report.finish()
    }
}
