// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use crate::context::{principal, Engine};
use crate::Acting;
use anyhow::Context;
use app_utils::EngineSettings;
use colored::*;
use core_policy::ResourceNode;
use std::fs;
use std::path::Path;
use warden_gateway::{
    Command, DisablePluginCommand, EnablePluginCommand, EnforcementState, ExitCode, PluginManager,
};

pub fn disable(
    acting: &Acting,
    settings: &EngineSettings,
    plugins: &Path,
    names: Vec<String>,
) -> anyhow::Result<ExitCode> {
    with_plugins(acting, settings, plugins, |manager| {
        Box::new(DisablePluginCommand::new(manager, names))
    })
}

pub fn enable(
    acting: &Acting,
    settings: &EngineSettings,
    plugins: &Path,
    names: Vec<String>,
) -> anyhow::Result<ExitCode> {
    with_plugins(acting, settings, plugins, |manager| {
        Box::new(EnablePluginCommand::new(manager, names))
    })
}

/// Load plugin state, run the command through the gateway, save if it ran
fn with_plugins<F>(
    acting: &Acting,
    settings: &EngineSettings,
    plugins: &Path,
    build: F,
) -> anyhow::Result<ExitCode>
where
    F: for<'m> FnOnce(&'m mut PluginManager) -> Box<dyn Command + 'm>,
{
    let engine = Engine::load(settings, &acting.grants)?;
    let principal = principal(&acting.user, &acting.groups)?;

    let content = fs::read_to_string(plugins)
        .with_context(|| format!("Failed to read {}", plugins.display()))?;
    let mut manager = PluginManager::from_toml(&content)
        .with_context(|| format!("Invalid plugin state in {}", plugins.display()))?;

    // Plugins delegate their checks to the root
    let outcome = {
        let mut command = build(&mut manager);
        engine
            .gateway
            .execute(&principal, &ResourceNode::root(), command.as_mut())
    };

    if outcome.state == EnforcementState::Executed {
        fs::write(plugins, manager.to_toml()?)
            .with_context(|| format!("Failed to write {}", plugins.display()))?;
    }

    if outcome.is_success() {
        println!("{}", outcome.message);
    } else {
        eprintln!("{} {}", "error:".red().bold(), outcome.message);
    }
    Ok(outcome.exit_code)
}
