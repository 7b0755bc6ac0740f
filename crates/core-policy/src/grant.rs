// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Grant table
//!
//! Who holds which permission, and where. Policy changes are rare and
//! decisions are constant, so the table is a versioned immutable
//! [`GrantSnapshot`] behind a pointer swap (read-copy-update):
//!
//! - readers clone the current `Arc` and evaluate against it without any
//!   further locking;
//! - writers build a complete new snapshot and publish it in one swap.
//!
//! A reader therefore sees either the old grant set or the new one, never a
//! mix.

use crate::error::{PolicyError, Result};
use crate::permission::{PermissionGraph, PermissionId};
use crate::resource::ResourceId;
use crate::MAX_GRANTS_PER_SNAPSHOT;
use core_identity::{Principal, Sid};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Where a grant applies
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every resource
    #[default]
    Everywhere,
    /// One resource (after delegation has been resolved)
    #[serde(rename = "resource")]
    On(ResourceId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everywhere => f.write_str("everywhere"),
            Self::On(resource) => write!(f, "on {}", resource),
        }
    }
}

/// One `(sid, permission, scope)` tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantEntry {
    /// Grantee
    pub sid: Sid,
    /// Granted permission
    pub permission: PermissionId,
    /// Where the grant applies
    #[serde(default)]
    pub scope: Scope,
}

impl GrantEntry {
    /// Create a grant entry
    #[must_use]
    pub const fn new(sid: Sid, permission: PermissionId, scope: Scope) -> Self {
        Self {
            sid,
            permission,
            scope,
        }
    }
}

impl fmt::Display for GrantEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {} {}", self.permission, self.sid, self.scope)
    }
}

/// Immutable, validated set of grants
#[derive(Debug, Clone, Default)]
pub struct GrantSnapshot {
    version: u64,
    entries: Vec<GrantEntry>,
    index: HashMap<Scope, HashMap<Sid, HashSet<PermissionId>>>,
}

impl GrantSnapshot {
    /// A snapshot granting nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate entries against `graph` and index them
    ///
    /// Duplicate entries are kept in `entries()` but collapse in the index.
    ///
    /// # Errors
    ///
    /// - `TooManyGrants` above [`MAX_GRANTS_PER_SNAPSHOT`]
    /// - `UnknownPermission` for permissions missing from `graph`
    pub fn new(entries: Vec<GrantEntry>, graph: &PermissionGraph) -> Result<Self> {
        if entries.len() > MAX_GRANTS_PER_SNAPSHOT {
            return Err(PolicyError::TooManyGrants {
                max: MAX_GRANTS_PER_SNAPSHOT,
                attempted: entries.len(),
            });
        }

        let mut index: HashMap<Scope, HashMap<Sid, HashSet<PermissionId>>> = HashMap::new();
        for entry in &entries {
            graph.require(&entry.permission)?;
            index
                .entry(entry.scope.clone())
                .or_default()
                .entry(entry.sid.clone())
                .or_default()
                .insert(entry.permission.clone());
        }

        Ok(Self {
            version: 0,
            entries,
            index,
        })
    }

    /// Version assigned when the snapshot was published (0 if never published)
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Entries in declaration order
    #[must_use]
    pub fn entries(&self) -> &[GrantEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot grants nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Permissions granted to `sid` at exactly `scope`
    #[must_use]
    pub fn granted(&self, sid: &Sid, scope: &Scope) -> Option<&HashSet<PermissionId>> {
        self.index.get(scope)?.get(sid)
    }

    /// Permissions granted to any Sid of `principal`, everywhere or on `owner`
    ///
    /// This is the raw grant set; implication is applied by the strategy.
    #[must_use]
    pub fn granted_to(&self, principal: &Principal, owner: &ResourceId) -> HashSet<&PermissionId> {
        let scoped = Scope::On(owner.clone());
        let mut granted = HashSet::new();
        for scope in [&Scope::Everywhere, &scoped] {
            let Some(by_sid) = self.index.get(scope) else {
                continue;
            };
            for sid in principal.sids() {
                if let Some(permissions) = by_sid.get(&sid) {
                    granted.extend(permissions.iter());
                }
            }
        }
        granted
    }

    /// Entries applying to `principal` at `owner`, whatever their permission
    pub fn entries_for<'s, 'q>(
        &'s self,
        principal: &'q Principal,
        owner: &'q ResourceId,
    ) -> impl Iterator<Item = &'s GrantEntry> + 'q
    where
        's: 'q,
    {
        self.entries.iter().filter(move |entry| {
            principal.matches(&entry.sid)
                && match &entry.scope {
                    Scope::Everywhere => true,
                    Scope::On(resource) => resource == owner,
                }
        })
    }
}

/// Runtime grant state: the current snapshot behind an atomic swap
#[derive(Debug)]
pub struct GrantTable {
    current: RwLock<Arc<GrantSnapshot>>,
}

impl GrantTable {
    /// Create a table publishing `initial` as version 1
    #[must_use]
    pub fn new(mut initial: GrantSnapshot) -> Self {
        initial.version = 1;
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current snapshot
    ///
    /// The lock is held only long enough to clone the `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GrantSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Version of the current snapshot
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Replace the current snapshot, returning its new version
    pub fn publish(&self, mut snapshot: GrantSnapshot) -> u64 {
        let mut current = self.current.write();
        snapshot.version = current.version + 1;
        let version = snapshot.version;
        *current = Arc::new(snapshot);
        tracing::info!(version, "grant snapshot published");
        version
    }

    /// Copy the current entries, let `edit` change them, validate and publish
    ///
    /// Writers are serialized, so concurrent updates are never lost. Readers
    /// keep getting the previous snapshot until the swap, and `edit` may
    /// itself read the table.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the edited entry list; the current
    /// snapshot stays in place.
    pub fn update<F>(&self, graph: &PermissionGraph, edit: F) -> Result<u64>
    where
        F: FnOnce(&mut Vec<GrantEntry>),
    {
        // Upgradable guard: other writers wait, readers do not
        let current = self.current.upgradable_read();
        let mut entries = current.entries.clone();
        edit(&mut entries);

        let mut next = GrantSnapshot::new(entries, graph)?;
        next.version = current.version + 1;
        let version = next.version;

        let mut current = RwLockUpgradableReadGuard::upgrade(current);
        *current = Arc::new(next);
        tracing::info!(version, "grant snapshot updated");
        Ok(version)
    }
}

impl Default for GrantTable {
    fn default() -> Self {
        Self::new(GrantSnapshot::empty())
    }
}
