// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

pub mod config;
pub mod plugin;
pub mod policy;
