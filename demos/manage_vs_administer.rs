//! Manage vs Administer
//!
//! This example walks through the split between the two system-wide
//! permissions:
//!
//! 1. Build the standard permission catalog with `Overall/Manage` enabled
//! 2. Grant `Administer` to one user and `Manage` to another
//! 3. Compare what each may do, and what each sees of the global configuration
//!
//! Run with: cargo run --example manage_vs_administer

use std::sync::Arc;
use warden_open_core::gateway::{ConfigEntity, DisablePluginCommand, PluginManager, WebAction};
use warden_open_core::policy::catalog::{
    standard_field_index, standard_graph, CatalogFlags, ADMINISTER, GLOBAL_CONFIGURATION, MANAGE,
    READ,
};
use warden_open_core::policy::{GrantSetBuilder, GrantTable, GrantTableStrategy, ResourceNode};
use warden_open_core::{AccessGateway, Principal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("warden - Manage vs Administer");
    println!("-----------------------------");
    println!();

    // -------------------------------------------------------------------------
    // Step 1: Catalog and grants
    // -------------------------------------------------------------------------
    // Manage is feature-flagged. With the flag off it stays registered but is
    // skipped during evaluation, so a Manage grant grants nothing.

    let graph = Arc::new(standard_graph(CatalogFlags::with_manage())?);
    let fields = Arc::new(standard_field_index(&graph)?);

    let snapshot = GrantSetBuilder::new()
        .grant([ADMINISTER])
        .to_user("admin")
        .grant([MANAGE, READ])
        .to_user("manager")
        .build(&graph)?;
    let table = Arc::new(GrantTable::new(snapshot));
    let strategy = GrantTableStrategy::new(Arc::clone(&graph), table);
    let gateway = AccessGateway::new(Arc::new(strategy), fields);

    let admin = Principal::new("admin")?;
    let manager = Principal::new("manager")?;
    let root = ResourceNode::root();

    // -------------------------------------------------------------------------
    // Step 2: HTTP-style actions
    // -------------------------------------------------------------------------

    println!("Actions on the root object:");
    for action in WebAction::ALL {
        let status = |who: &Principal| match gateway.authorize_action(who, &root, action) {
            Ok(()) => "200".to_string(),
            Err(rejection) => rejection.http_status().to_string(),
        };
        println!(
            "  {:<32} admin={} manager={}",
            action.path(),
            status(&admin),
            status(&manager)
        );
    }
    println!();

    // -------------------------------------------------------------------------
    // Step 3: Commands
    // -------------------------------------------------------------------------
    // Plugin administration needs Administer; the manager's attempt never runs.

    let mut plugins = PluginManager::new().with_plugin("git", Vec::<String>::new());
    let mut disable = DisablePluginCommand::new(&mut plugins, ["git"]);
    let outcome = gateway.execute(&manager, &root, &mut disable);
    println!(
        "manager: disable-plugin git -> exit {} ({})",
        outcome.exit_code.code(),
        outcome.message
    );
    println!();

    // -------------------------------------------------------------------------
    // Step 4: The global configuration form
    // -------------------------------------------------------------------------

    let configuration = ConfigEntity::from_toml(
        r#"
markupFormatter = "plain"
numExecutors = 2
quietPeriod = 5
shell = "/bin/sh"
systemMessage = "Welcome"
"#,
    )?;

    for who in [&admin, &manager] {
        let view = gateway.render_view(who, &root, &GLOBAL_CONFIGURATION, &configuration)?;
        println!("As {who}:");
        print!("{view}");
        println!();
    }

    // A manager's submission keeps only the fields they may edit
    let mut saved = configuration.clone();
    let submitted = ConfigEntity::new()
        .with("quietPeriod", 10_i64)
        .with("shell", "/bin/bash");
    let report =
        gateway.apply_submission(&manager, &root, &GLOBAL_CONFIGURATION, &mut saved, &submitted)?;
    println!(
        "manager submitted {} field(s), {} applied",
        submitted.len(),
        report.applied.len()
    );
    println!(
        "  quietPeriod = {:?}, shell = {:?}",
        saved.get("quietPeriod"),
        saved.get("shell")
    );

    println!();
    println!("-----------------------------");
    println!("Done.");

    Ok(())
}
