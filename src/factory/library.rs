//! Static mapping of logical library ids to paths.

use std::collections::BTreeMap;

use crate::error::{HostError, Result};

/// Logical id → path. Entries may be added, never changed.
#[derive(Debug, Clone, Default)]
pub struct LibraryList {
    entries: BTreeMap<String, String>,
}

impl LibraryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `logical_id` to `path`. A duplicate id fails with `AlreadyExists`.
    pub fn insert(&mut self, logical_id: &str, path: &str) -> Result<()> {
        if self.entries.contains_key(logical_id) {
            return Err(HostError::AlreadyExists(format!("library {logical_id}")));
        }
        self.entries.insert(logical_id.to_string(), path.to_string());
        Ok(())
    }

    pub fn path(&self, logical_id: &str) -> Option<&str> {
        self.entries.get(logical_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, path)| (id.as_str(), path.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
