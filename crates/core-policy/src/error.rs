// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Error types for core-policy
//!
//! Denial is not an error. A strategy that refuses access returns
//! `Ok(false)` / [`Decision::Denied`](crate::Decision::Denied); the variants
//! below are either fatal start-up configuration problems or programming
//! errors in the caller (asking about something that was never declared).

use crate::field::{EntityType, FieldId};
use crate::permission::PermissionId;
use crate::resource::ResourceId;
use thiserror::Error;

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur in policy operations
#[derive(Debug, Error)]
pub enum PolicyError {
    // ===== Configuration errors (fatal at start-up) =====
    /// The same `(group, name)` was registered twice
    #[error("Duplicate permission registration: {0}")]
    DuplicatePermission(PermissionId),

    /// `implied_by` names a permission that was never registered
    #[error("Permission {permission} is implied by unregistered permission {implied_by}")]
    UnknownImplication {
        /// Permission carrying the dangling edge
        permission: PermissionId,
        /// Missing implier
        implied_by: PermissionId,
    },

    /// Following `implied_by` edges leads back to the start
    #[error("Cyclic permission implication: {}", format_cycle(.cycle))]
    CyclicImplication {
        /// Permissions on the cycle, first one repeated at the end
        cycle: Vec<PermissionId>,
    },

    /// A field is editable with a permission that does not imply its view permission
    #[error("Field {field} of {entity}: edit permission {edit} does not imply view permission {view}")]
    InconsistentFieldPolicy {
        /// Entity type declaring the field
        entity: EntityType,
        /// Offending field
        field: FieldId,
        /// Permission required to view
        view: PermissionId,
        /// Permission required to edit
        edit: PermissionId,
    },

    /// A field was declared twice for the same entity type
    #[error("Field {field} declared twice for {entity}")]
    DuplicateField {
        /// Entity type
        entity: EntityType,
        /// Repeated field
        field: FieldId,
    },

    /// An entity type was declared twice
    #[error("Entity type {0} declared twice")]
    DuplicateEntity(EntityType),

    /// Snapshot exceeds the maximum number of grant entries
    #[error("Grant snapshot exceeds maximum {max} entries (attempted: {attempted})")]
    TooManyGrants {
        /// Maximum allowed entries
        max: usize,
        /// Attempted number of entries
        attempted: usize,
    },

    /// Document name exceeds maximum length
    #[error("Grant document name exceeds maximum {max} characters (length: {length})")]
    NameTooLong {
        /// Maximum allowed length
        max: usize,
        /// Actual name length
        length: usize,
    },

    /// Malformed grant declaration
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Malformed permission identifier (expected `Group/Name`)
    #[error("Invalid permission identifier: {0}")]
    InvalidPermissionId(String),

    /// Malformed resource path
    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    // ===== Programming errors (caller asked about something undeclared) =====
    /// Permission is not registered in the graph
    #[error("Unknown permission: {0}")]
    UnknownPermission(PermissionId),

    /// Entity type has no field policy
    #[error("Unknown entity type: {0}")]
    UnknownEntity(EntityType),

    /// Resource delegation chain does not terminate within the limit
    #[error("Delegation chain of {resource} exceeds maximum depth of {max}")]
    DelegationTooDeep {
        /// Resource the check started from
        resource: ResourceId,
        /// Maximum allowed depth
        max: usize,
    },

    // ===== Parsing =====
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl PolicyError {
    /// Whether this error belongs to start-up policy validation
    ///
    /// Configuration errors must stop the process before any decision is
    /// served; the remaining variants are caller bugs or parse failures.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePermission(_)
                | Self::UnknownImplication { .. }
                | Self::CyclicImplication { .. }
                | Self::InconsistentFieldPolicy { .. }
                | Self::DuplicateField { .. }
                | Self::DuplicateEntity(_)
                | Self::TooManyGrants { .. }
                | Self::NameTooLong { .. }
                | Self::InvalidGrant(_)
                | Self::InvalidPermissionId(_)
        )
    }
}

fn format_cycle(cycle: &[PermissionId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
