// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use crate::context::{principal, Engine};
use crate::Acting;
use anyhow::Context;
use app_utils::parser::parser_for;
use app_utils::{EngineSettings, GrantDocumentParser};
use colored::*;
use core_policy::catalog::standard_graph;
use core_policy::{GrantDocument, GrantEntry, PermissionGraph, PermissionId, SnapshotAuthorizer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use warden_gateway::{parse_resource, validate_grant_document_detailed, ExitCode};

pub fn check(file: &Path, settings: &EngineSettings) -> anyhow::Result<ExitCode> {
    println!("{} {}", "Checking grants:".bold(), file.display());

    let graph = standard_graph(settings.catalog_flags()).context("Invalid permission catalog")?;
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    // TOML gets positioned diagnostics; other formats only the parser's message
    let is_yaml = matches!(
        file.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if !is_yaml {
        let diagnostic = validate_grant_document_detailed(&content, &graph);
        if !diagnostic.valid {
            print_invalid(
                diagnostic.message.as_deref().unwrap_or("invalid document"),
                diagnostic.line,
                diagnostic.column,
            );
            return Ok(ExitCode::MalformedInput);
        }
    }
    let document = match parser_for(file)
        .parse(&content)
        .and_then(|document| document.to_snapshot(&graph).map(|_| document))
    {
        Ok(document) => document,
        Err(e) => {
            print_invalid(&e.to_string(), None, None);
            return Ok(ExitCode::MalformedInput);
        }
    };

    println!("  {} Document name: {}", "✓".green(), document.name());
    println!("  {} Declarations: {}", "✓".green(), document.grants().len());
    println!("  {} Grant entries: {}", "✓".green(), document.entry_count());

    let warnings = lint(&document, &graph);
    for warning in &warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    println!();
    if warnings.is_empty() {
        println!("{} Grants are valid!", "✓".green().bold());
    } else {
        println!(
            "{} Grants are valid with {} warning(s)",
            "⚠".yellow().bold(),
            warnings.len()
        );
    }

    Ok(ExitCode::Ok)
}

fn print_invalid(message: &str, line: Option<u32>, column: Option<u32>) {
    match (line, column) {
        (Some(line), Some(column)) => println!(
            "  {} {} (line {}, column {})",
            "✗".red(),
            message,
            line,
            column
        ),
        _ => println!("  {} {}", "✗".red(), message),
    }
}

/// Problems that do not make the document invalid
fn lint(document: &GrantDocument, graph: &PermissionGraph) -> Vec<String> {
    let entries = document.entries();
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for entry in &entries {
        if !seen.insert(entry) {
            warnings.push(format!("Duplicate grant: {entry}"));
        }
    }

    for entry in seen.iter().copied() {
        if graph
            .get(&entry.permission)
            .is_some_and(|permission| !permission.is_enabled())
        {
            warnings.push(format!("{} is disabled; grant has no effect", entry.permission));
        }
        if let Some(stronger) = implied_by_other(entry, &entries, graph) {
            warnings.push(format!("Redundant grant: {entry} (implied by {stronger})"));
        }
    }

    warnings.sort();
    warnings
}

/// An enabled, stronger permission granted to the same Sid at the same scope
fn implied_by_other<'a>(
    entry: &GrantEntry,
    entries: &'a [GrantEntry],
    graph: &PermissionGraph,
) -> Option<&'a PermissionId> {
    entries
        .iter()
        .filter(|other| other.sid == entry.sid && other.scope == entry.scope)
        .filter(|other| other.permission != entry.permission)
        .filter(|other| graph.get(&other.permission).is_some_and(|p| p.is_enabled()))
        .map(|other| &other.permission)
        .find(|stronger| graph.implies(stronger, &entry.permission))
}

pub fn explain(
    acting: &Acting,
    settings: &EngineSettings,
    permission: &str,
    resource: &str,
) -> anyhow::Result<ExitCode> {
    let engine = Engine::load(settings, &acting.grants)?;
    let principal = principal(&acting.user, &acting.groups)?;

    let permission: PermissionId = match permission.parse() {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return Ok(ExitCode::IllegalArgument);
        }
    };
    if !engine.graph.contains(&permission) {
        eprintln!("{} Unknown permission: {permission}", "error:".red().bold());
        return Ok(ExitCode::IllegalArgument);
    }
    let resource = match parse_resource(resource) {
        Ok(resource) => resource,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return Ok(ExitCode::IllegalArgument);
        }
    };

    let decision = engine.gateway.check(&principal, &resource, &permission)?;
    let verdict = if decision.is_granted() {
        "GRANTED".green().bold()
    } else {
        "DENIED".red().bold()
    };
    println!("{verdict} {permission} to {principal} on {}", resource_label(&resource));

    if let Some(table) = &engine.table {
        let snapshot = table.snapshot();
        let authorizer = SnapshotAuthorizer::new(&engine.graph, &snapshot);
        for grant in authorizer.matching_grants(&principal, &resource, &permission)? {
            println!("  {} {}", "via".dimmed(), grant);
        }
        println!(
            "  {}",
            format!(
                "evaluated against {} grant(s), snapshot version {}",
                authorizer.grant_count(),
                snapshot.version()
            )
            .dimmed()
        );
    }

    Ok(if decision.is_granted() {
        ExitCode::Ok
    } else {
        ExitCode::AccessDenied
    })
}

fn resource_label(resource: &dyn core_policy::Resource) -> String {
    let owner = core_policy::resolve_owner(resource)
        .map(|owner| owner.resource_id().to_string())
        .unwrap_or_default();
    let id = resource.resource_id().to_string();
    if owner.is_empty() || owner == id {
        id
    } else {
        format!("{id} (checked on {owner})")
    }
}
