// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use crate::context::{principal, Engine};
use crate::Acting;
use anyhow::Context;
use app_utils::EngineSettings;
use colored::*;
use core_policy::catalog::GLOBAL_CONFIGURATION;
use core_policy::ResourceNode;
use std::fs;
use std::path::Path;
use warden_gateway::{ConfigEntity, ExitCode, Rejection};

fn read_entity(path: &Path) -> anyhow::Result<ConfigEntity> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ConfigEntity::from_toml(&content)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

fn report_rejection(rejection: &Rejection) -> ExitCode {
    eprintln!("{} {}", "error:".red().bold(), rejection);
    rejection.exit_code()
}

pub fn show(acting: &Acting, settings: &EngineSettings, config: &Path) -> anyhow::Result<ExitCode> {
    let engine = Engine::load(settings, &acting.grants)?;
    let principal = principal(&acting.user, &acting.groups)?;
    let entity = read_entity(config)?;

    match engine.gateway.render_view(
        &principal,
        &ResourceNode::root(),
        &GLOBAL_CONFIGURATION,
        &entity,
    ) {
        Ok(view) => {
            print!("{view}");
            Ok(ExitCode::Ok)
        }
        Err(rejection) => Ok(report_rejection(&rejection)),
    }
}

pub fn apply(
    acting: &Acting,
    settings: &EngineSettings,
    config: &Path,
    submit: &Path,
) -> anyhow::Result<ExitCode> {
    let engine = Engine::load(settings, &acting.grants)?;
    let principal = principal(&acting.user, &acting.groups)?;
    let mut entity = read_entity(config)?;
    let submitted = read_entity(submit)?;

    let report = match engine.gateway.apply_submission(
        &principal,
        &ResourceNode::root(),
        &GLOBAL_CONFIGURATION,
        &mut entity,
        &submitted,
    ) {
        Ok(report) => report,
        Err(rejection) => return Ok(report_rejection(&rejection)),
    };

    fs::write(config, entity.to_toml()?)
        .with_context(|| format!("Failed to write {}", config.display()))?;

    // Discarded fields stay silent
    for field in &report.applied {
        println!("  {} {}", "✓".green(), field);
    }
    println!(
        "{} {} field(s) saved",
        "✓".green().bold(),
        report.applied.len()
    );
    Ok(ExitCode::Ok)
}
