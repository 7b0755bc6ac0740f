// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # core-policy
//!
//! Authorization decision engine with no dependencies on transport or UI layers.
//!
//! This crate provides the core domain logic for authorization, including:
//! - The permission graph (capabilities and their implication edges)
//! - The grant table (versioned snapshots of who holds what, where)
//! - Pluggable authorization strategies
//! - The field authorization index for filtered configuration views
//!
//! ## Limits
//!
//! - MAX_GRANTS_PER_SNAPSHOT = 4096
//! - MAX_DOCUMENT_NAME_LENGTH = 128
//! - MAX_DELEGATION_DEPTH = 32

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authorizer;
pub mod builder;
pub mod catalog;
pub mod document;
pub mod error;
pub mod field;
pub mod grant;
pub mod permission;
pub mod resource;

pub use authorizer::{
    AuthorizationStrategy, Decision, FullControlOnceLoggedIn, GrantTableStrategy, Pinned,
    SnapshotAuthorizer, Unsecured,
};
pub use builder::{GrantSetBuilder, PendingGrant};
pub use document::{GrantDeclaration, GrantDocument};
/// Re-export commonly used types
pub use error::{PolicyError, Result};
pub use field::{
    EntityPolicy, EntityType, FieldAccess, FieldAuthorizationIndex, FieldId, FieldIndexBuilder,
    FieldRecord,
};
pub use grant::{GrantEntry, GrantSnapshot, GrantTable, Scope};
pub use permission::{Permission, PermissionGraph, PermissionGraphBuilder, PermissionId};
pub use resource::{
    resolve_owner, Resource, ResourceId, ResourceKind, ResourceNode, MAX_DELEGATION_DEPTH,
};

/// Maximum number of entries in one grant snapshot
pub const MAX_GRANTS_PER_SNAPSHOT: usize = 4096;

/// Maximum length for a grant document name
pub const MAX_DOCUMENT_NAME_LENGTH: usize = 128;
