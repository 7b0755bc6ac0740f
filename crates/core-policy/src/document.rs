// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Grant documents
//!
//! Static policy tables shipped with a deployment, in TOML:
//!
//! ```toml
//! name = "operators"
//! version = 3
//!
//! [[grants]]
//! sid = { group = "operators" }
//! permissions = ["Overall/Manage", "Overall/Read"]
//!
//! [[grants]]
//! sid = "everyone"
//! permissions = ["Item/Build"]
//! scope = { resource = "job/nightly" }
//! ```
//!
//! ## Security Constraints
//!
//! Deserialization always validates (see [`GrantDocument`]):
//! - `MAX_DOCUMENT_NAME_LENGTH` (128): maximum document name length
//! - `MAX_GRANTS_PER_SNAPSHOT` (4096): maximum expanded grant entries

use crate::error::{PolicyError, Result};
use crate::grant::{GrantEntry, GrantSnapshot, Scope};
use crate::permission::{PermissionGraph, PermissionId};
use crate::{MAX_DOCUMENT_NAME_LENGTH, MAX_GRANTS_PER_SNAPSHOT};
use core_identity::Sid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Permissions granted to one Sid at one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDeclaration {
    /// Grantee
    pub sid: Sid,
    /// Granted permissions, as `Group/Name`
    pub permissions: Vec<PermissionId>,
    /// Where the grants apply (everywhere if omitted)
    #[serde(default)]
    pub scope: Scope,
}

/// A named, versioned list of grant declarations
///
/// # Security
///
/// Fields are private to enforce validation through deserialization.
/// The `#[serde(try_from)]` attribute ensures every deserialized document is
/// checked against the name and size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GrantDocumentRaw")]
pub struct GrantDocument {
    name: String,
    version: u64,
    metadata: BTreeMap<String, String>,
    grants: Vec<GrantDeclaration>,
}

fn default_version() -> u64 {
    1
}

/// Raw document structure for deserialization (internal use only)
#[derive(Debug, Clone, Deserialize)]
struct GrantDocumentRaw {
    name: String,
    #[serde(default = "default_version")]
    version: u64,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    grants: Vec<GrantDeclaration>,
}

impl TryFrom<GrantDocumentRaw> for GrantDocument {
    type Error = PolicyError;

    fn try_from(raw: GrantDocumentRaw) -> Result<Self> {
        let document = Self {
            name: raw.name,
            version: raw.version,
            metadata: raw.metadata,
            grants: raw.grants,
        };
        document.validate()?;
        Ok(document)
    }
}

impl GrantDocument {
    /// Create an empty document
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NameTooLong` or `InvalidGrant` for a bad name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let document = Self {
            name: name.into(),
            version: 1,
            metadata: BTreeMap::new(),
            grants: Vec::new(),
        };
        document.validate()?;
        Ok(document)
    }

    /// Document name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document version
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Metadata (deterministic order)
    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Grant declarations
    #[must_use]
    pub fn grants(&self) -> &[GrantDeclaration] {
        &self.grants
    }

    /// Add a declaration
    ///
    /// # Errors
    ///
    /// Returns the validation error if the document would become invalid
    pub fn add_grant(mut self, declaration: GrantDeclaration) -> Result<Self> {
        self.grants.push(declaration);
        self.validate()?;
        Ok(self)
    }

    /// Add metadata to this document
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of grant entries once declarations are expanded
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.grants.iter().map(|g| g.permissions.len()).sum()
    }

    /// Expand declarations into one entry per permission
    #[must_use]
    pub fn entries(&self) -> Vec<GrantEntry> {
        self.grants
            .iter()
            .flat_map(|declaration| {
                declaration.permissions.iter().map(move |permission| {
                    GrantEntry::new(
                        declaration.sid.clone(),
                        permission.clone(),
                        declaration.scope.clone(),
                    )
                })
            })
            .collect()
    }

    /// Structural validation (independent of any permission graph)
    ///
    /// # Errors
    ///
    /// - `InvalidGrant` for an empty name or a declaration without permissions
    /// - `NameTooLong` above `MAX_DOCUMENT_NAME_LENGTH`
    /// - `TooManyGrants` above `MAX_GRANTS_PER_SNAPSHOT` expanded entries
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(PolicyError::InvalidGrant(
                "Document name cannot be empty".to_string(),
            ));
        }

        if self.name.len() > MAX_DOCUMENT_NAME_LENGTH {
            return Err(PolicyError::NameTooLong {
                max: MAX_DOCUMENT_NAME_LENGTH,
                length: self.name.len(),
            });
        }

        for (i, declaration) in self.grants.iter().enumerate() {
            if declaration.permissions.is_empty() {
                return Err(PolicyError::InvalidGrant(format!(
                    "Grant #{} for {} lists no permissions",
                    i + 1,
                    declaration.sid
                )));
            }
        }

        let count = self.entry_count();
        if count > MAX_GRANTS_PER_SNAPSHOT {
            return Err(PolicyError::TooManyGrants {
                max: MAX_GRANTS_PER_SNAPSHOT,
                attempted: count,
            });
        }

        Ok(())
    }

    /// Validate against `graph` and build a snapshot
    ///
    /// # Errors
    ///
    /// `UnknownPermission` for permissions missing from `graph`
    pub fn to_snapshot(&self, graph: &PermissionGraph) -> Result<GrantSnapshot> {
        GrantSnapshot::new(self.entries(), graph)
    }

    /// Load a document from a TOML string
    ///
    /// # Errors
    ///
    /// TOML parse failures and validation failures (see `validate()`)
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let document: Self = toml::from_str(toml_str)?;
        Ok(document)
    }

    /// Serialize the document to a TOML string
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::SerializationError` if TOML serialization fails
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }
}
