// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use core_policy::{PolicyError, ResourceId, ResourceKind, ResourceNode, Result};
use std::sync::Arc;

/// Names of the built-in node, which is governed by the root object
const BUILT_IN_COMPUTERS: [&str; 2] = ["(master)", "(built-in)"];

/// Helper function to parse a resource path into a [`ResourceNode`]
///
/// - `/` is the root object;
/// - `plugin/<name>` delegates to the root;
/// - `computer/(built-in)` and `computer/(master)` delegate to the root;
/// - `computer/<name>`, `job/<path>` and `view/<name>` own their checks.
///
/// # Errors
///
/// `InvalidResourcePath` for empty segments or unknown prefixes
pub fn parse_resource(path: &str) -> Result<ResourceNode> {
    if path == "/" {
        return Ok(ResourceNode::root());
    }

    let invalid = || PolicyError::InvalidResourcePath(path.to_string());
    let (prefix, name) = path.split_once('/').ok_or_else(invalid)?;
    if name.is_empty() || name.split('/').any(str::is_empty) {
        return Err(invalid());
    }

    let root = || Arc::new(ResourceNode::root());
    let id = ResourceId::new(path);

    match prefix {
        "plugin" => Ok(ResourceNode::new(ResourceKind::Plugin, id).delegating_to(root())),
        "computer" if BUILT_IN_COMPUTERS.contains(&name) => {
            Ok(ResourceNode::new(ResourceKind::Computer, id).delegating_to(root()))
        }
        "computer" => Ok(ResourceNode::new(ResourceKind::Computer, id)),
        "job" => Ok(ResourceNode::new(ResourceKind::Item, id)),
        "view" => Ok(ResourceNode::new(ResourceKind::View, id)),
        _ => Err(invalid()),
    }
}
