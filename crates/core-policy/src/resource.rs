// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Resources that own permission checks
//!
//! A resource may hand its authorization decision to another resource (a
//! plugin defers to the root object that manages it). Delegation is a
//! property of the resource: the engine only follows the pointer.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Maximum number of delegation hops followed before giving up
pub const MAX_DELEGATION_DEPTH: usize = 32;

/// Identifier of the root system object
pub const ROOT_RESOURCE: &str = "/";

/// Stable resource path such as `/`, `job/build-app` or `computer/agent-1`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a resource identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the root system object
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_RESOURCE.to_string())
    }

    /// Path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of addressable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The root system object
    Root,
    /// A computer or build agent
    Computer,
    /// A job or other item
    Item,
    /// A view
    View,
    /// An installed plugin
    Plugin,
}

/// Anything that can be the target of a permission check
pub trait Resource: fmt::Debug + Send + Sync {
    /// Stable identifier, used to match resource-scoped grants
    fn resource_id(&self) -> &ResourceId;

    /// Kind of object
    fn kind(&self) -> ResourceKind;

    /// Resource that owns authorization for this one, if it defers
    fn delegate(&self) -> Option<&dyn Resource> {
        None
    }
}

/// Follow delegation to the resource that owns the decision
///
/// # Errors
///
/// Returns `PolicyError::DelegationTooDeep` when more than
/// [`MAX_DELEGATION_DEPTH`] hops are needed (a cyclic or runaway chain).
pub fn resolve_owner(resource: &dyn Resource) -> Result<&dyn Resource> {
    let mut current = resource;
    for _ in 0..=MAX_DELEGATION_DEPTH {
        match current.delegate() {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }
    Err(PolicyError::DelegationTooDeep {
        resource: resource.resource_id().clone(),
        max: MAX_DELEGATION_DEPTH,
    })
}

/// Plain resource value with an optional delegation pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    id: ResourceId,
    kind: ResourceKind,
    delegate: Option<Arc<ResourceNode>>,
}

impl ResourceNode {
    /// A resource owning its own checks
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            kind,
            delegate: None,
        }
    }

    /// The root system object
    #[must_use]
    pub fn root() -> Self {
        Self::new(ResourceKind::Root, ResourceId::root())
    }

    /// Defer authorization to `owner`
    #[must_use]
    pub fn delegating_to(mut self, owner: Arc<ResourceNode>) -> Self {
        self.delegate = Some(owner);
        self
    }
}

impl Resource for ResourceNode {
    fn resource_id(&self) -> &ResourceId {
        &self.id
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn delegate(&self) -> Option<&dyn Resource> {
        self.delegate.as_deref().map(|node| node as &dyn Resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_of_non_delegating_resource_is_itself() {
        let job = ResourceNode::new(ResourceKind::Item, "job/app");
        let owner = resolve_owner(&job).unwrap();
        assert_eq!(owner.resource_id().as_str(), "job/app");
    }

    #[test]
    fn delegation_is_followed_to_the_end() {
        let root = Arc::new(ResourceNode::root());
        let folder = Arc::new(ResourceNode::new(ResourceKind::Item, "job/folder").delegating_to(root));
        let job = ResourceNode::new(ResourceKind::Item, "job/folder/app").delegating_to(folder);

        let owner = resolve_owner(&job).unwrap();
        assert_eq!(owner.kind(), ResourceKind::Root);
        assert_eq!(owner.resource_id(), &ResourceId::root());
    }

    #[derive(Debug)]
    struct Looping(ResourceId);

    impl Resource for Looping {
        fn resource_id(&self) -> &ResourceId {
            &self.0
        }

        fn kind(&self) -> ResourceKind {
            ResourceKind::Item
        }

        fn delegate(&self) -> Option<&dyn Resource> {
            Some(self)
        }
    }

    #[test]
    fn runaway_delegation_fails_loudly() {
        let looping = Looping(ResourceId::new("job/loop"));
        assert!(matches!(
            resolve_owner(&looping),
            Err(PolicyError::DelegationTooDeep { max: MAX_DELEGATION_DEPTH, .. })
        ));
    }
}
