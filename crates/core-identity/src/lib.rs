// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # identity
//!
//! Resolved principals and security identifiers for warden.
//!
//! Authentication happens elsewhere. By the time a request reaches the
//! authorization engine, the security realm has already established who is
//! acting and which groups they belong to; this crate only carries those
//! facts.
//!
//! ## Example
//!
//! ```
//! use core_identity::{Principal, Sid};
//!
//! # fn example() -> Result<(), core_identity::IdentityError> {
//! let manager = Principal::new("manager")?.with_group("operators")?;
//!
//! let sids: Vec<Sid> = manager.sids().collect();
//! assert!(sids.contains(&Sid::user("manager")));
//! assert!(sids.contains(&Sid::group("operators")));
//! assert!(sids.contains(&Sid::Everyone));
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::{IdentityError, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Name of the implicit group every principal belongs to
pub const EVERYONE: &str = "everyone";

/// Name carried by the anonymous principal
pub const ANONYMOUS: &str = "anonymous";

/// Security identifier: the grantee side of a grant entry
///
/// Serialized as `{ user = "alice" }`, `{ group = "ops" }` or `"everyone"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sid {
    /// A single user, by principal name
    User(String),
    /// A group, by group name
    Group(String),
    /// The implicit group containing every principal, anonymous included
    Everyone,
}

impl Sid {
    /// Create a user Sid
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    /// Create a group Sid
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => write!(f, "user:{}", name),
            Self::Group(name) => write!(f, "group:{}", name),
            Self::Everyone => f.write_str(EVERYONE),
        }
    }
}

impl FromStr for Sid {
    type Err = IdentityError;

    /// Parses `user:<name>`, `group:<name>` or `everyone`.
    /// A bare name is taken as a user.
    fn from_str(s: &str) -> Result<Self> {
        if s == EVERYONE {
            return Ok(Self::Everyone);
        }
        let (kind, name) = match s.split_once(':') {
            Some((kind, name)) => (kind, name),
            None => ("user", s),
        };
        if name.is_empty() {
            return Err(IdentityError::InvalidSid(s.to_string()));
        }
        match kind {
            "user" => Ok(Self::User(name.to_string())),
            "group" => Ok(Self::Group(name.to_string())),
            _ => Err(IdentityError::InvalidSid(s.to_string())),
        }
    }
}

/// An authenticated identity together with its resolved group memberships
///
/// Membership in [`EVERYONE`] is implicit and is never stored in `groups`.
/// The anonymous principal is an ordinary principal: it simply has no
/// explicit groups, so only `everyone` grants (and grants to the user
/// `anonymous`) apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    name: String,
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl Principal {
    /// Create a principal without explicit group memberships
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmptyName` if `name` is empty
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        Ok(Self {
            name,
            groups: BTreeSet::new(),
        })
    }

    /// The anonymous principal
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            name: ANONYMOUS.to_string(),
            groups: BTreeSet::new(),
        }
    }

    /// Add a group membership
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidGroup` for an empty name or for the
    /// reserved `everyone` group, which is always implied.
    pub fn with_group(mut self, group: impl Into<String>) -> Result<Self> {
        let group = group.into();
        if group.is_empty() || group == EVERYONE {
            return Err(IdentityError::InvalidGroup(group));
        }
        self.groups.insert(group);
        Ok(self)
    }

    /// Add several group memberships
    ///
    /// # Errors
    ///
    /// Fails on the first invalid group (see [`Principal::with_group`])
    pub fn with_groups<I, S>(self, groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        groups
            .into_iter()
            .try_fold(self, |principal, group| principal.with_group(group))
    }

    /// Principal name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicit group memberships (without `everyone`)
    #[must_use]
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Whether this is the anonymous principal
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS
    }

    /// Whether this principal belongs to `group` (`everyone` always matches)
    #[must_use]
    pub fn is_member_of(&self, group: &str) -> bool {
        group == EVERYONE || self.groups.contains(group)
    }

    /// Every Sid this principal answers to: its user, its groups, `everyone`
    pub fn sids(&self) -> impl Iterator<Item = Sid> + '_ {
        std::iter::once(Sid::User(self.name.clone()))
            .chain(self.groups.iter().cloned().map(Sid::Group))
            .chain(std::iter::once(Sid::Everyone))
    }

    /// Whether a grant to `sid` applies to this principal
    #[must_use]
    pub fn matches(&self, sid: &Sid) -> bool {
        match sid {
            Sid::User(name) => *name == self.name,
            Sid::Group(group) => self.groups.contains(group),
            Sid::Everyone => true,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
