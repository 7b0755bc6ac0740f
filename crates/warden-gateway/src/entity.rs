// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Configuration entities
//!
//! A composite configuration object stored as a flat TOML table: one key per
//! field. Keys are kept sorted, so serializing the same values always yields
//! the same bytes.

use core_policy::{FieldId, PolicyError, Result};
use std::collections::BTreeMap;

/// Field values of one configuration object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigEntity {
    values: BTreeMap<FieldId, toml::Value>,
}

impl ConfigEntity {
    /// Create an empty entity
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML table
    ///
    /// # Errors
    ///
    /// `TomlError` for malformed input
    pub fn from_toml(input: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(input)?;
        Ok(table.into_iter().collect())
    }

    /// Serialize to TOML
    ///
    /// # Errors
    ///
    /// `SerializationError` if a value cannot be represented
    pub fn to_toml(&self) -> Result<String> {
        let table: toml::Table = self
            .values
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), value.clone()))
            .collect();
        toml::to_string(&table).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Value of `field`
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&toml::Value> {
        self.values.get(field)
    }

    /// Set `field`, returning the previous value
    pub fn set(&mut self, field: impl Into<FieldId>, value: toml::Value) -> Option<toml::Value> {
        self.values.insert(field.into(), value)
    }

    /// Builder-style [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, field: impl Into<FieldId>, value: impl Into<toml::Value>) -> Self {
        self.set(field, value.into());
        self
    }

    /// Remove `field`
    pub fn remove(&mut self, field: &str) -> Option<toml::Value> {
        self.values.remove(field)
    }

    /// Fields and values, sorted by field
    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &toml::Value)> {
        self.values.iter()
    }

    /// Number of fields with a value
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field has a value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<FieldId>> FromIterator<(K, toml::Value)> for ConfigEntity {
    fn from_iter<I: IntoIterator<Item = (K, toml::Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_is_sorted() {
        let entity = ConfigEntity::new()
            .with("systemMessage", "hello")
            .with("numExecutors", 2_i64)
            .with("adminAddress", "ops@example.com");

        let rendered = entity.to_toml().unwrap();
        let keys: Vec<_> = rendered
            .lines()
            .filter_map(|line| line.split_once(" = ").map(|(k, _)| k))
            .collect();
        assert_eq!(keys, vec!["adminAddress", "numExecutors", "systemMessage"]);
    }

    #[test]
    fn toml_round_trip_keeps_nested_values() {
        let input = r#"
numExecutors = 2
shell = "/bin/sh"

[globalNodeProperties]
JAVA_HOME = "/opt/jdk"
"#;
        let entity = ConfigEntity::from_toml(input).unwrap();
        assert_eq!(entity.len(), 3);
        assert_eq!(entity.get("numExecutors"), Some(&toml::Value::Integer(2)));

        let reparsed = ConfigEntity::from_toml(&entity.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, entity);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            ConfigEntity::from_toml("numExecutors = "),
            Err(PolicyError::TomlError(_))
        ));
    }
}
