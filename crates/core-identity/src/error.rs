// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use thiserror::Error;

/// Errors for malformed principals and security identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Principal name cannot be empty")]
    EmptyName,

    #[error("Invalid group name: {0}")]
    InvalidGroup(String),

    #[error("Invalid security identifier: {0}")]
    InvalidSid(String),
}
/// Specific Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
