// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Field authorization index
//!
//! Which configuration inputs a principal may see or change is policy data,
//! declared per entity type as `(field, view permission, edit permission)`
//! records. The render path and the submit path both read the same index, so
//! they cannot disagree about a field.
//!
//! ## Invariant
//!
//! A field's edit permission must imply (or equal) its view permission. The
//! index refuses to build otherwise, and [`FieldAuthorizationIndex::field_access`]
//! only evaluates the edit permission for fields that are already visible, so
//! a field is never editable but hidden.

use crate::authorizer::AuthorizationStrategy;
use crate::error::{PolicyError, Result};
use crate::permission::{PermissionGraph, PermissionId};
use crate::resource::Resource;
use core_identity::Principal;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Type of a composite configuration object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(Cow<'static, str>);

impl EntityType {
    /// Entity type usable in `const` declarations
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Entity type built at runtime
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one field of a configuration entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Create a field identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for FieldId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Minimum permissions to view and to edit one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    field: FieldId,
    label: String,
    view: PermissionId,
    edit: PermissionId,
}

impl FieldRecord {
    /// Declare a field
    #[must_use]
    pub fn new(
        field: impl Into<FieldId>,
        label: impl Into<String>,
        view: PermissionId,
        edit: PermissionId,
    ) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            view,
            edit,
        }
    }

    /// Field identifier
    #[must_use]
    pub fn field(&self) -> &FieldId {
        &self.field
    }

    /// Human label shown next to the input
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Permission required to see the field
    #[must_use]
    pub fn view_permission(&self) -> &PermissionId {
        &self.view
    }

    /// Permission required to change the field
    #[must_use]
    pub fn edit_permission(&self) -> &PermissionId {
        &self.edit
    }
}

/// Field policy of one configuration entity type
#[derive(Debug, Clone)]
pub struct EntityPolicy {
    entity_type: EntityType,
    access: PermissionId,
    fields: Vec<FieldRecord>,
}

impl EntityPolicy {
    /// Declare an entity type whose form requires `access` to open at all
    #[must_use]
    pub fn new(entity_type: EntityType, access: PermissionId) -> Self {
        Self {
            entity_type,
            access,
            fields: Vec::new(),
        }
    }

    /// Add a field record
    #[must_use]
    pub fn field(mut self, record: FieldRecord) -> Self {
        self.fields.push(record);
        self
    }

    /// Entity type
    #[must_use]
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Permission required to open the form
    #[must_use]
    pub fn access_permission(&self) -> &PermissionId {
        &self.access
    }

    /// Field records, in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldRecord] {
        &self.fields
    }

    /// Look up one field record
    #[must_use]
    pub fn record(&self, field: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|r| r.field.as_str() == field)
    }
}

/// Outcome of field-level authorization for one principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAccess {
    /// Not rendered, not accepted on submit
    Hidden,
    /// Rendered, submitted values discarded
    ReadOnly,
    /// Rendered and accepted on submit
    Editable,
}

impl FieldAccess {
    /// Whether the field is rendered
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// Whether submitted values are applied
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Editable)
    }
}

/// Collects entity policies and validates them against a permission graph
#[derive(Debug, Default)]
pub struct FieldIndexBuilder {
    entities: Vec<EntityPolicy>,
}

impl FieldIndexBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity policy
    #[must_use]
    pub fn entity(mut self, policy: EntityPolicy) -> Self {
        self.entities.push(policy);
        self
    }

    /// Validate and freeze the index
    ///
    /// # Errors
    ///
    /// - `UnknownPermission` if a record or access permission is not in `graph`
    /// - `DuplicateEntity` / `DuplicateField` for repeated declarations
    /// - `InconsistentFieldPolicy` if an edit permission does not imply the
    ///   field's view permission
    pub fn build(self, graph: &PermissionGraph) -> Result<FieldAuthorizationIndex> {
        let mut entities = HashMap::with_capacity(self.entities.len());

        for policy in self.entities {
            graph.require(&policy.access)?;

            let mut seen = BTreeSet::new();
            for record in &policy.fields {
                if !seen.insert(record.field.as_str()) {
                    return Err(PolicyError::DuplicateField {
                        entity: policy.entity_type.clone(),
                        field: record.field.clone(),
                    });
                }
                graph.require(&record.view)?;
                graph.require(&record.edit)?;
                if !graph.implies(&record.edit, &record.view) {
                    return Err(PolicyError::InconsistentFieldPolicy {
                        entity: policy.entity_type.clone(),
                        field: record.field.clone(),
                        view: record.view.clone(),
                        edit: record.edit.clone(),
                    });
                }
            }

            let entity_type = policy.entity_type.clone();
            if entities.insert(entity_type.clone(), policy).is_some() {
                return Err(PolicyError::DuplicateEntity(entity_type));
            }
        }

        Ok(FieldAuthorizationIndex { entities })
    }
}

/// Validated, immutable field policies keyed by entity type
#[derive(Debug)]
pub struct FieldAuthorizationIndex {
    entities: HashMap<EntityType, EntityPolicy>,
}

impl FieldAuthorizationIndex {
    /// Start declaring an index
    #[must_use]
    pub fn builder() -> FieldIndexBuilder {
        FieldIndexBuilder::new()
    }

    /// Policy of one entity type
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownEntity` if the type was never declared
    pub fn entity(&self, entity_type: &EntityType) -> Result<&EntityPolicy> {
        self.entities
            .get(entity_type)
            .ok_or_else(|| PolicyError::UnknownEntity(entity_type.clone()))
    }

    /// Declared entity types
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.keys()
    }

    /// Per-field access of `principal` on `resource`
    ///
    /// Each distinct permission is evaluated once, and every field is decided
    /// against one pinned view of `strategy` (see
    /// [`AuthorizationStrategy::pin`]).
    ///
    /// # Errors
    ///
    /// Propagates `UnknownEntity` and strategy errors
    pub fn field_access<S>(
        &self,
        strategy: &S,
        principal: &Principal,
        resource: &dyn Resource,
        entity_type: &EntityType,
    ) -> Result<BTreeMap<FieldId, FieldAccess>>
    where
        S: AuthorizationStrategy + ?Sized,
    {
        let policy = self.entity(entity_type)?;
        let strategy = strategy.pin();
        let mut decided: HashMap<PermissionId, bool> = HashMap::new();
        let mut decide = |permission: &PermissionId| -> Result<bool> {
            if let Some(&granted) = decided.get(permission) {
                return Ok(granted);
            }
            let granted = strategy.has_permission(principal, resource, permission)?;
            decided.insert(permission.clone(), granted);
            Ok(granted)
        };

        let mut access = BTreeMap::new();
        for record in &policy.fields {
            let state = if !decide(&record.view)? {
                FieldAccess::Hidden
            } else if decide(&record.edit)? {
                FieldAccess::Editable
            } else {
                FieldAccess::ReadOnly
            };
            access.insert(record.field.clone(), state);
        }
        Ok(access)
    }

    /// Fields `principal` may see
    ///
    /// # Errors
    ///
    /// See [`field_access`](Self::field_access)
    pub fn fields_visible_to<S>(
        &self,
        strategy: &S,
        principal: &Principal,
        resource: &dyn Resource,
        entity_type: &EntityType,
    ) -> Result<BTreeSet<FieldId>>
    where
        S: AuthorizationStrategy + ?Sized,
    {
        Ok(self
            .field_access(strategy, principal, resource, entity_type)?
            .into_iter()
            .filter(|(_, access)| access.is_visible())
            .map(|(field, _)| field)
            .collect())
    }

    /// Fields `principal` may change; always a subset of the visible fields
    ///
    /// # Errors
    ///
    /// See [`field_access`](Self::field_access)
    pub fn fields_editable_to<S>(
        &self,
        strategy: &S,
        principal: &Principal,
        resource: &dyn Resource,
        entity_type: &EntityType,
    ) -> Result<BTreeSet<FieldId>>
    where
        S: AuthorizationStrategy + ?Sized,
    {
        Ok(self
            .field_access(strategy, principal, resource, entity_type)?
            .into_iter()
            .filter(|(_, access)| access.is_editable())
            .map(|(field, _)| field)
            .collect())
    }
}
