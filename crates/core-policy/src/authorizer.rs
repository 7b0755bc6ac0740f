// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Authorization strategies
//!
//! A strategy maps `(principal, resource, permission)` to a boolean. The
//! default one, [`GrantTableStrategy`], consults the grant table:
//!
//! 1. follow the resource's delegation chain to the resource owning the check;
//! 2. take one grant snapshot and collect what the principal's user, groups
//!    and `everyone` hold there and everywhere;
//! 3. walk from the requested permission up its `implied_by` chain: any
//!    enabled permission on the way that was granted satisfies the check.
//!
//! Step 3 is the grant set expanded by implication, evaluated lazily. A
//! disabled permission on the chain is skipped, so granting it has no effect
//! of its own.

use crate::catalog::READ;
use crate::error::Result;
use crate::grant::{GrantEntry, GrantSnapshot, GrantTable};
use crate::permission::{PermissionGraph, PermissionId};
use crate::resource::{resolve_owner, Resource};
use core_identity::Principal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome of a permission check
///
/// Denial is an expected result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The principal holds the permission
    Granted,
    /// The principal does not hold the permission
    Denied,
}

impl Decision {
    /// Whether access was granted
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl From<bool> for Decision {
    fn from(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

/// Pluggable decision function
///
/// Implementations must be free of side effects and safe to call from many
/// request threads at once.
pub trait AuthorizationStrategy: Send + Sync + fmt::Debug {
    /// Whether `principal` holds `permission` on `resource`
    ///
    /// # Errors
    ///
    /// Only for caller bugs: an unregistered permission or a delegation chain
    /// that does not terminate. Denial is `Ok(false)`.
    fn has_permission(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<bool>;

    /// [`has_permission`](Self::has_permission) as a [`Decision`]
    ///
    /// # Errors
    ///
    /// Same as `has_permission`
    fn check(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<Decision> {
        self.has_permission(principal, resource, permission)
            .map(Decision::from)
    }

    /// A view of this strategy frozen at the current policy state
    ///
    /// Decisions that must agree with each other, such as every field of one
    /// form, go through a single pinned view.
    fn pin(&self) -> Pinned<'_>;
}

/// Strategy frozen at one policy state, see [`AuthorizationStrategy::pin`]
#[derive(Debug)]
pub enum Pinned<'a> {
    /// Stateless strategies pin to themselves
    Borrowed(&'a dyn AuthorizationStrategy),
    /// Grant-table strategies pin to one snapshot
    Snapshot {
        /// Permission graph
        graph: Arc<PermissionGraph>,
        /// Snapshot current at pin time
        snapshot: Arc<GrantSnapshot>,
    },
}

impl AuthorizationStrategy for Pinned<'_> {
    fn has_permission(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<bool> {
        match self {
            Self::Borrowed(strategy) => strategy.has_permission(principal, resource, permission),
            Self::Snapshot { graph, snapshot } => {
                SnapshotAuthorizer::new(graph, snapshot).has_permission(principal, resource, permission)
            }
        }
    }

    fn pin(&self) -> Pinned<'_> {
        match self {
            Self::Borrowed(strategy) => Pinned::Borrowed(*strategy),
            Self::Snapshot { graph, snapshot } => Pinned::Snapshot {
                graph: Arc::clone(graph),
                snapshot: Arc::clone(snapshot),
            },
        }
    }
}

/// Evaluates checks against one borrowed grant snapshot
///
/// ## Example
///
/// ```
/// use core_identity::Principal;
/// use core_policy::catalog::{standard_graph, CatalogFlags, ADMINISTER, MANAGE};
/// use core_policy::{GrantSetBuilder, ResourceNode, SnapshotAuthorizer};
///
/// let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
/// let snapshot = GrantSetBuilder::new()
///     .grant([MANAGE])
///     .everywhere()
///     .to_user("manager")
///     .build(&graph)
///     .unwrap();
///
/// let authorizer = SnapshotAuthorizer::new(&graph, &snapshot);
/// let manager = Principal::new("manager").unwrap();
/// let root = ResourceNode::root();
///
/// assert!(authorizer.has_permission(&manager, &root, &MANAGE).unwrap());
/// assert!(!authorizer.has_permission(&manager, &root, &ADMINISTER).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SnapshotAuthorizer<'a> {
    graph: &'a PermissionGraph,
    snapshot: &'a GrantSnapshot,
}

impl<'a> SnapshotAuthorizer<'a> {
    /// Create an authorizer over `snapshot`
    #[must_use]
    pub const fn new(graph: &'a PermissionGraph, snapshot: &'a GrantSnapshot) -> Self {
        Self { graph, snapshot }
    }

    /// Whether `principal` holds `permission` on `resource`
    ///
    /// # Errors
    ///
    /// `UnknownPermission` or `DelegationTooDeep`
    pub fn has_permission(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<bool> {
        self.graph.require(permission)?;
        let owner = resolve_owner(resource)?;
        let granted = self.snapshot.granted_to(principal, owner.resource_id());

        let satisfied = self
            .graph
            .implied_by_chain(permission)
            .filter(|p| p.is_enabled())
            .any(|p| granted.contains(p.id()));

        tracing::trace!(
            principal = %principal,
            resource = %resource.resource_id(),
            owner = %owner.resource_id(),
            %permission,
            version = self.snapshot.version(),
            satisfied,
            "permission evaluated"
        );

        Ok(satisfied)
    }

    /// Grants that satisfy the check, for explanations and auditing
    ///
    /// # Errors
    ///
    /// `UnknownPermission` or `DelegationTooDeep`
    pub fn matching_grants(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<Vec<&'a GrantEntry>> {
        self.graph.require(permission)?;
        let owner = resolve_owner(resource)?.resource_id().clone();
        let satisfying: Vec<&PermissionId> = self
            .graph
            .implied_by_chain(permission)
            .filter(|p| p.is_enabled())
            .map(|p| p.id())
            .collect();

        Ok(self
            .snapshot
            .entries_for(principal, &owner)
            .filter(|entry| satisfying.contains(&&entry.permission))
            .collect())
    }

    /// Number of grant entries in the snapshot
    #[must_use]
    pub fn grant_count(&self) -> usize {
        self.snapshot.len()
    }
}

/// Default strategy: the grant table and the permission graph
#[derive(Debug, Clone)]
pub struct GrantTableStrategy {
    graph: Arc<PermissionGraph>,
    table: Arc<GrantTable>,
}

impl GrantTableStrategy {
    /// Create a strategy over a shared graph and table
    #[must_use]
    pub const fn new(graph: Arc<PermissionGraph>, table: Arc<GrantTable>) -> Self {
        Self { graph, table }
    }

    /// Permission graph
    #[must_use]
    pub fn graph(&self) -> &Arc<PermissionGraph> {
        &self.graph
    }

    /// Grant table, for publishing policy changes
    #[must_use]
    pub fn table(&self) -> &Arc<GrantTable> {
        &self.table
    }
}

impl AuthorizationStrategy for GrantTableStrategy {
    fn has_permission(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<bool> {
        let snapshot = self.table.snapshot();
        SnapshotAuthorizer::new(&self.graph, &snapshot).has_permission(principal, resource, permission)
    }

    fn pin(&self) -> Pinned<'_> {
        Pinned::Snapshot {
            graph: Arc::clone(&self.graph),
            snapshot: self.table.snapshot(),
        }
    }
}

/// Everyone, anonymous included, holds every permission
#[derive(Debug, Clone)]
pub struct Unsecured {
    graph: Arc<PermissionGraph>,
}

impl Unsecured {
    /// Create the strategy; the graph is still used to reject unknown permissions
    #[must_use]
    pub const fn new(graph: Arc<PermissionGraph>) -> Self {
        Self { graph }
    }
}

impl AuthorizationStrategy for Unsecured {
    fn has_permission(
        &self,
        _principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<bool> {
        self.graph.require(permission)?;
        resolve_owner(resource)?;
        Ok(true)
    }

    fn pin(&self) -> Pinned<'_> {
        Pinned::Borrowed(self)
    }
}

/// Authenticated principals hold everything; anonymous ones at most read
#[derive(Debug, Clone)]
pub struct FullControlOnceLoggedIn {
    graph: Arc<PermissionGraph>,
    allow_anonymous_read: bool,
}

impl FullControlOnceLoggedIn {
    /// Create the strategy
    #[must_use]
    pub const fn new(graph: Arc<PermissionGraph>, allow_anonymous_read: bool) -> Self {
        Self {
            graph,
            allow_anonymous_read,
        }
    }
}

impl AuthorizationStrategy for FullControlOnceLoggedIn {
    fn has_permission(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<bool> {
        self.graph.require(permission)?;
        resolve_owner(resource)?;
        if !principal.is_anonymous() {
            return Ok(true);
        }
        Ok(self.allow_anonymous_read && self.graph.implies(&READ, permission))
    }

    fn pin(&self) -> Pinned<'_> {
        Pinned::Borrowed(self)
    }
}
