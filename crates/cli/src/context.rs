// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Engine assembly from settings and files on disk

use anyhow::Context;
use app_utils::{EngineSettings, StrategyKind};
use core_identity::Principal;
use core_policy::catalog::{standard_field_index, standard_graph};
use core_policy::{
    AuthorizationStrategy, FullControlOnceLoggedIn, GrantTable, GrantTableStrategy,
    PermissionGraph, Unsecured,
};
use std::path::Path;
use std::sync::Arc;
use warden_gateway::AccessGateway;

/// Everything a command needs to reach a decision
#[derive(Debug)]
pub struct Engine {
    pub graph: Arc<PermissionGraph>,
    /// Present when decisions come from the grant table
    pub table: Option<Arc<GrantTable>>,
    pub gateway: AccessGateway,
}

impl Engine {
    /// Build the catalog, load `grants` and install the configured strategy
    pub fn load(settings: &EngineSettings, grants: &Path) -> anyhow::Result<Self> {
        let graph = Arc::new(
            standard_graph(settings.catalog_flags()).context("Invalid permission catalog")?,
        );
        let fields = Arc::new(standard_field_index(&graph).context("Invalid field policy")?);

        let document = app_utils::load_grant_document(grants)
            .with_context(|| format!("Failed to load grants from {}", grants.display()))?;
        let snapshot = document
            .to_snapshot(&graph)
            .with_context(|| format!("Invalid grants in {}", grants.display()))?;

        let mut table = None;
        let strategy: Arc<dyn AuthorizationStrategy> = match settings.authorization.strategy {
            StrategyKind::GrantTable => {
                let grants = Arc::new(GrantTable::new(snapshot));
                table = Some(Arc::clone(&grants));
                Arc::new(GrantTableStrategy::new(Arc::clone(&graph), grants))
            }
            StrategyKind::Unsecured => Arc::new(Unsecured::new(Arc::clone(&graph))),
            StrategyKind::FullControlOnceLoggedIn => Arc::new(FullControlOnceLoggedIn::new(
                Arc::clone(&graph),
                settings.authorization.allow_anonymous_read,
            )),
        };

        tracing::info!(
            grants = %grants.display(),
            strategy = ?settings.authorization.strategy,
            entries = document.entry_count(),
            "engine ready"
        );

        Ok(Self {
            gateway: AccessGateway::new(strategy, fields),
            graph,
            table,
        })
    }
}

/// Resolve the acting principal from command-line arguments
pub fn principal(user: &str, groups: &[String]) -> anyhow::Result<Principal> {
    let principal = Principal::new(user)
        .and_then(|p| p.with_groups(groups.iter().cloned()))
        .with_context(|| format!("Invalid principal {user:?}"))?;
    Ok(principal)
}
