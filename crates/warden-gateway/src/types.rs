// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use core_policy::{EntityType, FieldId, PolicyError, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Process exit codes of command-line actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitCode {
    /// Success
    Ok,
    /// Unexpected failure
    UnknownError,
    /// Arguments could not be parsed
    MalformedInput,
    /// The system is in a state that forbids the action
    IllegalState,
    /// An argument has an unacceptable value
    IllegalArgument,
    /// The action was interrupted
    Aborted,
    /// The principal lacks the required permission
    AccessDenied,
    /// Credentials were rejected
    BadCredentials,
    /// Some targets were left untouched because enabled plugins depend on them
    UnmetDependency,
    /// A named plugin is not installed
    NoSuchPlugin,
}

impl ExitCode {
    /// Numeric process exit code
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::UnknownError => 1,
            Self::MalformedInput => 2,
            Self::IllegalState => 3,
            Self::IllegalArgument => 4,
            Self::Aborted => 5,
            Self::AccessDenied => 6,
            Self::BadCredentials => 7,
            Self::UnmetDependency => 16,
            Self::NoSuchPlugin => 17,
        }
    }

    /// Whether this is the success code
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why the gateway refused a request
///
/// `Forbidden` never carries policy detail: the caller learns that access
/// was denied, not which permission was missing.
#[derive(Debug, Error)]
pub enum Rejection {
    /// The principal lacks the required permission
    #[error("forbidden")]
    Forbidden,

    /// The check itself failed (unknown permission or entity, runaway delegation)
    #[error("internal authorization error: {0}")]
    Internal(#[from] PolicyError),
}

impl Rejection {
    /// HTTP status for web-style callers
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Forbidden => 403,
            Self::Internal(_) => 500,
        }
    }

    /// Exit code for command-line callers
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Forbidden => ExitCode::AccessDenied,
            Self::Internal(_) => ExitCode::UnknownError,
        }
    }
}

/// Failure reported by a command that was allowed to run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    /// Exit code to report
    pub code: ExitCode,
    /// Message for the caller
    pub message: String,
}

impl CommandError {
    /// Create a command error
    #[must_use]
    pub fn new(code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Lifecycle of one enforcement request
///
/// `Requested → Evaluating → {Granted, Denied}`; a granted command then
/// reaches `Executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementState {
    /// Received, not yet evaluated
    Requested,
    /// Decision in progress
    Evaluating,
    /// Allowed, not yet acted upon
    Granted,
    /// Refused; nothing was executed
    Denied,
    /// Allowed and executed
    Executed,
}

/// Result of running a command through the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Command name
    pub command: String,
    /// Final state (`Denied` or `Executed`)
    pub state: EnforcementState,
    /// Exit code to report
    pub exit_code: ExitCode,
    /// Message for the caller
    pub message: String,
}

impl CommandOutcome {
    /// Whether the command ran and succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.state, EnforcementState::Executed) && self.exit_code.is_success()
    }
}

/// One field of a filtered configuration view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    /// Field identifier
    pub field: FieldId,
    /// Human label
    pub label: String,
    /// Current value, if the entity has one
    pub value: Option<toml::Value>,
    /// Whether the principal may change the value
    pub editable: bool,
}

/// Configuration view with every hidden field removed
///
/// Hidden fields are absent entirely: no label, no value, no placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    /// Entity type rendered
    pub entity: EntityType,
    /// Resource the view was rendered for
    pub resource: ResourceId,
    /// Visible fields, in declaration order
    pub fields: Vec<RenderedField>,
}

impl FormView {
    /// Look up a rendered field
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.field.as_str() == field)
    }

    /// Whether `field` is rendered at all
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.field(field).is_some()
    }
}

impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.entity, self.resource)?;
        for field in &self.fields {
            let value = field
                .value
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), ToString::to_string);
            let mode = if field.editable { "" } else { " (read-only)" };
            writeln!(f, "  {} [{}] = {}{}", field.label, field.field, value, mode)?;
        }
        Ok(())
    }
}

/// What a submission changed
///
/// Discarded fields are reported for logging only; they are never echoed to
/// the submitting principal as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    /// Editable fields whose submitted value was applied
    pub applied: BTreeSet<FieldId>,
    /// Submitted fields that were not editable or not declared
    pub discarded: BTreeSet<FieldId>,
}

/// Grant document validation diagnostic
///
/// Returned by `validate_grant_document_detailed` to provide structured error
/// information including line and column numbers for precise error reporting
/// in editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDiagnostic {
    /// Whether the document passed validation
    pub valid: bool,
    /// Human-readable error message if validation failed, None if valid
    pub message: Option<String>,
    /// Line number where error occurred (1-indexed), None if not applicable
    pub line: Option<u32>,
    /// Column number where error occurred (1-indexed), None if not applicable
    pub column: Option<u32>,
}

impl PolicyDiagnostic {
    pub(crate) fn valid() -> Self {
        Self {
            valid: true,
            message: None,
            line: None,
            column: None,
        }
    }

    pub(crate) fn invalid(
        message: impl Into<String>,
        (line, column): (Option<u32>, Option<u32>),
    ) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            line,
            column,
        }
    }
}
