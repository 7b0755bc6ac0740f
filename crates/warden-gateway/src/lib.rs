// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # warden-gateway
//!
//! Access enforcement gateway for the warden decision engine.
//!
//! This crate turns decisions into outcomes: command exit codes, HTTP-style
//! rejections and configuration views filtered field by field. It is the
//! only place where callers touch the engine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod commands;
pub mod entity;
mod gateway;
mod types;
mod utils;
mod validation;

// Re-export main types
pub use actions::WebAction;
pub use commands::{Command, DisablePluginCommand, EnablePluginCommand, PluginManager};
pub use entity::ConfigEntity;
pub use gateway::AccessGateway;
pub use types::{
    CommandError, CommandOutcome, EnforcementState, ExitCode, FormView, PolicyDiagnostic,
    Rejection, RenderedField, SubmissionReport,
};
pub use utils::parse_resource;
pub use validation::{validate_grant_document, validate_grant_document_detailed};
