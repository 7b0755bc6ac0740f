// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Tracing subscriber setup

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber writing to stderr
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice is an error
/// (a subscriber is already installed).
///
/// # Errors
///
/// `Telemetry` if `default_filter` is not a valid directive or a global
/// subscriber is already set
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| Error::Telemetry(format!("invalid filter {default_filter:?}: {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Telemetry(e.to_string()))
}
