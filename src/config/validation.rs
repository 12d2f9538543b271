//! Configuration validation.
//!
//! # Responsibilities
//! - Check that every passive entry present in the file has a usable type
//! - Check that it matches the type of the key's default
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Entries the key map does not know are ignored

use thiserror::Error;

use crate::config::schema::{ConfigValue, PassiveKeyMap};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("[{group}] is not a table")]
    NotATable { group: String },

    #[error("[{group}] {name}: unsupported value type {found}")]
    Unsupported { group: String, name: String, found: &'static str },

    #[error("[{group}] {name}: expected {expected}, found {found}")]
    TypeMismatch {
        group: String,
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Validate a passive configuration document against its key map.
pub fn validate_passive(keys: &PassiveKeyMap, document: &toml::Table) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (_, key) in keys.iter() {
        let Some(group) = document.get(&key.group) else {
            continue;
        };
        let Some(table) = group.as_table() else {
            let error = ValidationError::NotATable { group: key.group.clone() };
            if !errors.contains(&error) {
                errors.push(error);
            }
            continue;
        };
        let Some(raw) = table.get(&key.name) else {
            continue;
        };

        let Some(value) = ConfigValue::from_toml(raw) else {
            errors.push(ValidationError::Unsupported {
                group: key.group.clone(),
                name: key.name.clone(),
                found: raw.type_str(),
            });
            continue;
        };

        if let Some(default) = &key.default {
            if !default.accepts(&value) {
                errors.push(ValidationError::TypeMismatch {
                    group: key.group.clone(),
                    name: key.name.clone(),
                    expected: default.type_name(),
                    found: value.type_name(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
