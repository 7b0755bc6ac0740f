// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use crate::types::PolicyDiagnostic;
use core_policy::{GrantDocument, PermissionGraph, PolicyError, Result};

/// Validates a grant document TOML string
///
/// Checks that the document parses, passes its structural limits and only
/// names permissions registered in `graph`.
///
/// # Errors
///
/// The first validation failure
pub fn validate_grant_document(document_toml: &str, graph: &PermissionGraph) -> Result<GrantDocument> {
    let document = GrantDocument::from_toml(document_toml)?;
    document.to_snapshot(graph)?;
    Ok(document)
}

/// Validates a grant document TOML string with precise error reporting
#[must_use]
pub fn validate_grant_document_detailed(
    document_toml: &str,
    graph: &PermissionGraph,
) -> PolicyDiagnostic {
    // 1. Syntax and structural validation (TOML)
    let document = match GrantDocument::from_toml(document_toml) {
        Ok(document) => document,
        Err(e) => {
            // toml error format: "TOML parse error at line 1, column 10"
            let msg = e.to_string();
            let position = parse_toml_error_position(&msg);
            return PolicyDiagnostic::invalid(msg, position);
        }
    };

    // 2. Semantic validation against the permission graph
    match document.to_snapshot(graph) {
        Ok(_) => PolicyDiagnostic::valid(),
        Err(PolicyError::UnknownPermission(id)) => PolicyDiagnostic::invalid(
            format!("Unknown permission: {}", id),
            locate(document_toml, &format!("\"{}\"", id)),
        ),
        Err(e) => PolicyDiagnostic::invalid(e.to_string(), (None, None)),
    }
}

/// 1-based position of the first occurrence of `needle`, pointing inside the quotes
fn locate(text: &str, needle: &str) -> (Option<u32>, Option<u32>) {
    text.lines()
        .enumerate()
        .find_map(|(i, line)| {
            line.find(needle).map(|col| {
                (
                    u32::try_from(i + 1).ok(),
                    u32::try_from(col + 2).ok(),
                )
            })
        })
        .unwrap_or((None, None))
}

// Helper to extract line info from toml error string
fn parse_toml_error_position(msg: &str) -> (Option<u32>, Option<u32>) {
    // Example: "TOML parse error at line 1, column 10"

    if let Some(line_idx) = msg.find("line ") {
        if let Some(col_idx) = msg.find("column ") {
            let line_str = &msg[line_idx + 5..];
            let line_end = line_str.find(',').unwrap_or(line_str.len());
            let line = line_str[..line_end].trim().parse::<u32>().ok();

            let col_str = &msg[col_idx + 7..];
            let col_end = col_str
                .find(|c: char| !c.is_numeric())
                .unwrap_or(col_str.len());
            let col = col_str[..col_end].trim().parse::<u32>().ok();

            return (line, col);
        }
    }
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_extracted() {
        assert_eq!(
            parse_toml_error_position("TOML parse error at line 3, column 12\n  |"),
            (Some(3), Some(12))
        );
        assert_eq!(parse_toml_error_position("no position"), (None, None));
    }

    #[test]
    fn needle_is_located() {
        let text = "name = \"x\"\n\n  permissions = [\"Overall/Mange\"]\n";
        assert_eq!(locate(text, "\"Overall/Mange\""), (Some(3), Some(19)));
        assert_eq!(locate(text, "absent"), (None, None));
    }
}
