// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Builder pattern for ergonomic grant declaration

use crate::error::Result;
use crate::grant::{GrantEntry, GrantSnapshot, Scope};
use crate::permission::{PermissionGraph, PermissionId};
use crate::resource::ResourceId;
use core_identity::Sid;

/// Builder for bulk grant definitions with a fluent API
///
/// Each `grant(...)` opens a pending grant that is closed by naming its
/// grantee. The scope defaults to everywhere.
///
/// # Examples
///
/// ```
/// use core_policy::catalog::{standard_graph, CatalogFlags, ADMINISTER, ITEM_BUILD, MANAGE, READ};
/// use core_policy::GrantSetBuilder;
///
/// let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
///
/// let snapshot = GrantSetBuilder::new()
///     .grant([ADMINISTER])
///     .everywhere()
///     .to_user("admin")
///     .grant([MANAGE, READ])
///     .everywhere()
///     .to_group("operators")
///     .grant([ITEM_BUILD])
///     .on("job/nightly")
///     .to_everyone()
///     .build(&graph)
///     .unwrap();
///
/// assert_eq!(snapshot.len(), 4);
/// ```
#[derive(Debug, Default)]
pub struct GrantSetBuilder {
    entries: Vec<GrantEntry>,
}

impl GrantSetBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start granting `permissions`
    #[must_use]
    pub fn grant<I>(self, permissions: I) -> PendingGrant
    where
        I: IntoIterator<Item = PermissionId>,
    {
        PendingGrant {
            builder: self,
            permissions: permissions.into_iter().collect(),
            scope: Scope::Everywhere,
        }
    }

    /// Add a pre-constructed entry
    #[must_use]
    pub fn add_entry(mut self, entry: GrantEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Entries declared so far
    #[must_use]
    pub fn entries(&self) -> &[GrantEntry] {
        &self.entries
    }

    /// Validate the entries against `graph`
    ///
    /// # Errors
    ///
    /// See [`GrantSnapshot::new`]
    pub fn build(self, graph: &PermissionGraph) -> Result<GrantSnapshot> {
        GrantSnapshot::new(self.entries, graph)
    }
}

/// Grant waiting for its scope and grantee
#[derive(Debug)]
#[must_use = "a pending grant does nothing until a grantee is named"]
pub struct PendingGrant {
    builder: GrantSetBuilder,
    permissions: Vec<PermissionId>,
    scope: Scope,
}

impl PendingGrant {
    /// Apply on every resource (the default)
    pub fn everywhere(mut self) -> Self {
        self.scope = Scope::Everywhere;
        self
    }

    /// Apply on one resource only
    pub fn on(mut self, resource: impl Into<ResourceId>) -> Self {
        self.scope = Scope::On(resource.into());
        self
    }

    /// Grant to `sid`
    pub fn to(self, sid: Sid) -> GrantSetBuilder {
        let Self {
            mut builder,
            permissions,
            scope,
        } = self;
        builder.entries.extend(
            permissions
                .into_iter()
                .map(|permission| GrantEntry::new(sid.clone(), permission, scope.clone())),
        );
        builder
    }

    /// Grant to a user
    pub fn to_user(self, name: impl Into<String>) -> GrantSetBuilder {
        self.to(Sid::User(name.into()))
    }

    /// Grant to a group
    pub fn to_group(self, name: impl Into<String>) -> GrantSetBuilder {
        self.to(Sid::Group(name.into()))
    }

    /// Grant to every principal, anonymous included
    pub fn to_everyone(self) -> GrantSetBuilder {
        self.to(Sid::Everyone)
    }
}
