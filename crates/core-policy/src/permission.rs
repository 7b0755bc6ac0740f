// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Permission graph
//!
//! Permissions are immutable value nodes keyed by `(group, name)`. Each node
//! may name one stronger permission that implies it (`implied_by`); the
//! resulting edges form a forest. Holding a stronger permission satisfies a
//! check for every permission below it, never the reverse:
//!
//! ```text
//! Overall/Administer
//!   ├── Overall/Manage        (Manage never satisfies Administer)
//!   ├── Overall/Read
//!   └── Overall/RunScripts
//! ```
//!
//! The graph is declared once at start-up through [`PermissionGraphBuilder`]
//! and shared read-only afterwards.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a permission: `(group, name)`, written `Group/Name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionId {
    group: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl PermissionId {
    /// Identifier usable in `const` declarations
    #[must_use]
    pub const fn from_static(group: &'static str, name: &'static str) -> Self {
        Self {
            group: Cow::Borrowed(group),
            name: Cow::Borrowed(name),
        }
    }

    /// Identifier built at runtime
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: Cow::Owned(group.into()),
            name: Cow::Owned(name.into()),
        }
    }

    /// Owning permission group
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Short name within the group
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

impl FromStr for PermissionId {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(group, name))
            }
            _ => Err(PolicyError::InvalidPermissionId(s.to_string())),
        }
    }
}

impl TryFrom<String> for PermissionId {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PermissionId> for String {
    fn from(id: PermissionId) -> Self {
        id.to_string()
    }
}

/// A declared capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    id: PermissionId,
    label: String,
    implied_by: Option<PermissionId>,
    enabled: bool,
}

impl Permission {
    /// Declare an enabled permission with no implier
    #[must_use]
    pub fn new(id: PermissionId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            implied_by: None,
            enabled: true,
        }
    }

    /// Declare the stronger permission whose grant implies this one
    #[must_use]
    pub fn with_implied_by(mut self, stronger: PermissionId) -> Self {
        self.implied_by = Some(stronger);
        self
    }

    /// Enable or disable this permission for the deployment
    ///
    /// A disabled permission cannot be held on its own: checks for it are
    /// answered by the enabled permissions above it.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Identifier
    #[must_use]
    pub fn id(&self) -> &PermissionId {
        &self.id
    }

    /// Human label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The stronger permission implying this one, if any
    #[must_use]
    pub fn implied_by(&self) -> Option<&PermissionId> {
        self.implied_by.as_ref()
    }

    /// Whether the permission exists in this deployment
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Collects permission declarations and validates them into a graph
///
/// Declarations may reference implying permissions that are registered
/// later; everything is resolved in [`build`](Self::build).
///
/// # Example
///
/// ```
/// use core_policy::{Permission, PermissionGraphBuilder, PermissionId};
///
/// const ADMIN: PermissionId = PermissionId::from_static("Overall", "Administer");
/// const MANAGE: PermissionId = PermissionId::from_static("Overall", "Manage");
///
/// let graph = PermissionGraphBuilder::new()
///     .register(Permission::new(MANAGE, "Manage").with_implied_by(ADMIN))
///     .register(Permission::new(ADMIN, "Administer"))
///     .build()
///     .unwrap();
///
/// assert!(graph.implies(&ADMIN, &MANAGE));
/// assert!(!graph.implies(&MANAGE, &ADMIN));
/// ```
#[derive(Debug, Default)]
pub struct PermissionGraphBuilder {
    declared: Vec<Permission>,
}

impl PermissionGraphBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permission declaration
    #[must_use]
    pub fn register(mut self, permission: Permission) -> Self {
        self.declared.push(permission);
        self
    }

    /// Register several declarations
    #[must_use]
    pub fn register_all(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.declared.extend(permissions);
        self
    }

    /// Validate the declarations and freeze them into a graph
    ///
    /// # Errors
    ///
    /// - `DuplicatePermission` if an identifier is registered twice
    /// - `UnknownImplication` if `implied_by` names an unregistered permission
    /// - `CyclicImplication` if implication edges form a cycle
    pub fn build(self) -> Result<PermissionGraph> {
        let nodes = self.declared;

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, permission) in nodes.iter().enumerate() {
            if index.insert(permission.id.clone(), i).is_some() {
                return Err(PolicyError::DuplicatePermission(permission.id.clone()));
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        for permission in &nodes {
            let parent = match &permission.implied_by {
                None => None,
                Some(stronger) => Some(*index.get(stronger).ok_or_else(|| {
                    PolicyError::UnknownImplication {
                        permission: permission.id.clone(),
                        implied_by: stronger.clone(),
                    }
                })?),
            };
            parents.push(parent);
        }

        detect_cycle(&nodes, &parents)?;

        tracing::debug!(permissions = nodes.len(), "permission graph built");

        Ok(PermissionGraph {
            nodes,
            index,
            parents,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Every node has at most one parent, so each walk is a simple path
fn detect_cycle(nodes: &[Permission], parents: &[Option<usize>]) -> Result<()> {
    let mut state = vec![Visit::New; nodes.len()];

    for start in 0..nodes.len() {
        let mut path: Vec<usize> = Vec::new();
        let mut current = Some(start);

        while let Some(i) = current {
            match state[i] {
                Visit::Done => break,
                Visit::OnPath => {
                    let from = path.iter().position(|&p| p == i).unwrap_or(0);
                    let mut cycle: Vec<PermissionId> =
                        path[from..].iter().map(|&p| nodes[p].id.clone()).collect();
                    cycle.push(nodes[i].id.clone());
                    return Err(PolicyError::CyclicImplication { cycle });
                }
                Visit::New => {
                    state[i] = Visit::OnPath;
                    path.push(i);
                    current = parents[i];
                }
            }
        }

        for i in path {
            state[i] = Visit::Done;
        }
    }

    Ok(())
}

/// Immutable, validated permission graph
#[derive(Debug)]
pub struct PermissionGraph {
    nodes: Vec<Permission>,
    index: HashMap<PermissionId, usize>,
    parents: Vec<Option<usize>>,
}

impl PermissionGraph {
    /// Start declaring a graph
    #[must_use]
    pub fn builder() -> PermissionGraphBuilder {
        PermissionGraphBuilder::new()
    }

    /// Look up a permission
    #[must_use]
    pub fn get(&self, id: &PermissionId) -> Option<&Permission> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether `id` is registered
    #[must_use]
    pub fn contains(&self, id: &PermissionId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a permission, failing loudly for unknown identifiers
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownPermission` if `id` is not registered
    pub fn require(&self, id: &PermissionId) -> Result<&Permission> {
        self.get(id)
            .ok_or_else(|| PolicyError::UnknownPermission(id.clone()))
    }

    /// Whether holding `stronger` guarantees `weaker`
    ///
    /// True when both are the same permission or when `stronger` is reached
    /// by following `implied_by` edges upward from `weaker`. Unknown
    /// identifiers imply nothing.
    #[must_use]
    pub fn implies(&self, stronger: &PermissionId, weaker: &PermissionId) -> bool {
        let (Some(&target), Some(&start)) = (self.index.get(stronger), self.index.get(weaker))
        else {
            return false;
        };
        std::iter::successors(Some(start), |&i| self.parents[i]).any(|i| i == target)
    }

    /// The permission itself followed by every permission implying it,
    /// nearest first. Empty for unknown identifiers.
    pub fn implied_by_chain<'a>(
        &'a self,
        id: &PermissionId,
    ) -> impl Iterator<Item = &'a Permission> + 'a {
        std::iter::successors(self.index.get(id).copied(), move |&i| self.parents[i])
            .map(move |i| &self.nodes[i])
    }

    /// Every registered permission, in declaration order
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.nodes.iter()
    }

    /// Permissions belonging to `group`
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Permission> + 'a {
        self.nodes.iter().filter(move |p| p.id.group() == group)
    }

    /// Number of registered permissions
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
