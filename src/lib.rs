// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # warden-open-core
//!
//! Authorization decision engine separating the narrow `Overall/Manage`
//! permission from full `Overall/Administer` control.
//!
//! This crate provides a unified API over the workspace:
//!
//! - **Identity**: principals, groups and grantee identifiers
//! - **Policy**: the permission graph, versioned grant tables, pluggable
//!   strategies and the field authorization index
//! - **Gateway**: command exit codes, HTTP-style rejections and filtered
//!   configuration views
//! - **Utils**: settings, grant document loading and tracing setup
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_open_core::identity::Principal;
//! use warden_open_core::policy::catalog::{standard_graph, CatalogFlags, ADMINISTER, MANAGE};
//! use warden_open_core::policy::{GrantSetBuilder, GrantTable, GrantTableStrategy, ResourceNode};
//! use warden_open_core::policy::AuthorizationStrategy;
//!
//! let graph = Arc::new(standard_graph(CatalogFlags::with_manage()).unwrap());
//! let snapshot = GrantSetBuilder::new()
//!     .grant([MANAGE])
//!     .to_user("manager")
//!     .build(&graph)
//!     .unwrap();
//! let strategy = GrantTableStrategy::new(graph, Arc::new(GrantTable::new(snapshot)));
//!
//! let manager = Principal::new("manager").unwrap();
//! let root = ResourceNode::root();
//! assert!(strategy.has_permission(&manager, &root, &MANAGE).unwrap());
//! assert!(!strategy.has_permission(&manager, &root, &ADMINISTER).unwrap());
//! ```
//!
//! ## Architecture
//!
//! This facade crate re-exports the following modules:
//!
//! - [`identity`] - Principals and Sids (from `core-identity`)
//! - [`policy`] - Decision engine (from `core-policy`)
//! - [`gateway`] - Enforcement gateway (from `warden-gateway`)
//! - [`utils`] - Settings, parsing and tracing (from `app-utils`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/warden-open-core/1.0.1")]

/// Identity module.
///
/// Re-exports `core_identity` for principals and grantee identifiers.
pub mod identity {
    pub use core_identity::*;
}

/// Policy engine module.
///
/// Re-exports `core_policy` for permission checks and field filtering.
pub mod policy {
    pub use core_policy::*;
}

/// Enforcement gateway module.
///
/// Re-exports `warden_gateway` for commands, actions and configuration views.
pub mod gateway {
    pub use warden_gateway::*;
}

/// Utilities module.
///
/// Re-exports `app_utils` for settings, grant documents and tracing.
pub mod utils {
    pub use app_utils::*;
}

// Convenience re-exports at root level
pub use core_identity::{Principal, Sid};
pub use core_policy::{AuthorizationStrategy, Decision, PermissionId, Resource};
pub use warden_gateway::{AccessGateway, ExitCode, Rejection};
