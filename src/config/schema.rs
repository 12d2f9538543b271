//! Configuration value model and key maps.
//!
//! Configuration is addressed by integer key ids chosen by the application.
//! Passive keys additionally name the group (TOML table) and entry they are
//! read from; active keys are stored under their id inside one group.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Integer index of a configuration entry.
pub type ConfigKey = i32;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ConfigValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Text(_) => "string",
        }
    }

    /// Convert from a TOML value. Arrays, tables and datetimes are not
    /// supported as configuration values.
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Boolean(b) => Some(ConfigValue::Bool(*b)),
            toml::Value::Integer(i) => Some(ConfigValue::Integer(*i)),
            toml::Value::Float(f) => Some(ConfigValue::Float(*f)),
            toml::Value::String(s) => Some(ConfigValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_toml(&self) -> toml::Value {
        match self {
            ConfigValue::Bool(b) => toml::Value::Boolean(*b),
            ConfigValue::Integer(i) => toml::Value::Integer(*i),
            ConfigValue::Float(f) => toml::Value::Float(*f),
            ConfigValue::Text(s) => toml::Value::String(s.clone()),
        }
    }

    /// Whether a stored value may replace a default of this value's type.
    pub fn accepts(&self, stored: &ConfigValue) -> bool {
        matches!(
            (self, stored),
            (ConfigValue::Bool(_), ConfigValue::Bool(_))
                | (ConfigValue::Integer(_), ConfigValue::Integer(_))
                | (ConfigValue::Float(_), ConfigValue::Float(_) | ConfigValue::Integer(_))
                | (ConfigValue::Text(_), ConfigValue::Text(_))
        )
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Integer(v)
    }
}

impl From<u32> for ConfigValue {
    fn from(v: u32) -> Self {
        ConfigValue::Integer(i64::from(v))
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Text(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Text(v)
    }
}

/// Typed read of a [`ConfigValue`].
pub trait FromConfigValue: Sized {
    fn from_config_value(value: ConfigValue) -> Result<Self>;
}

fn mismatch(expected: &str, value: &ConfigValue) -> HostError {
    HostError::InvalidArgument(format!("expected {expected}, found {}", value.type_name()))
}

impl FromConfigValue for ConfigValue {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromConfigValue for bool {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromConfigValue for i64 {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Integer(i) => Ok(i),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FromConfigValue for u64 {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        let i = i64::from_config_value(value)?;
        u64::try_from(i).map_err(|_| HostError::InvalidArgument(format!("{i} is negative")))
    }
}

impl FromConfigValue for u32 {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        let i = i64::from_config_value(value)?;
        u32::try_from(i).map_err(|_| HostError::InvalidArgument(format!("{i} does not fit in u32")))
    }
}

impl FromConfigValue for usize {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        let i = i64::from_config_value(value)?;
        usize::try_from(i)
            .map_err(|_| HostError::InvalidArgument(format!("{i} does not fit in usize")))
    }
}

impl FromConfigValue for f64 {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Float(f) => Ok(f),
            ConfigValue::Integer(i) => Ok(i as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromConfigValue for String {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Text(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromConfigValue for PathBuf {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        String::from_config_value(value).map(PathBuf::from)
    }
}

/// Location and default of a passive configuration entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PassiveKey {
    /// TOML table the entry lives in.
    pub group: String,
    /// Entry name inside the table.
    pub name: String,
    /// Used when the file has no value.
    pub default: Option<ConfigValue>,
}

impl PassiveKey {
    pub fn new(group: &str, name: &str, default: impl Into<ConfigValue>) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            default: Some(default.into()),
        }
    }

    /// Entry without a default; reading it unset fails with `DoesNotExist`.
    pub fn required(group: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            default: None,
        }
    }
}

/// Default of an active configuration entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveKey {
    pub default: Option<ConfigValue>,
}

impl ActiveKey {
    pub fn with_default(default: impl Into<ConfigValue>) -> Self {
        Self {
            default: Some(default.into()),
        }
    }

    pub fn unset() -> Self {
        Self { default: None }
    }
}

/// Ordered map from key id to key data. Ids are unique.
#[derive(Debug, Clone)]
pub struct KeyMap<T> {
    entries: BTreeMap<ConfigKey, T>,
}

impl<T> Default for KeyMap<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> KeyMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. A duplicate id fails with `AlreadyExists` and leaves the map
    /// unchanged.
    pub fn insert(&mut self, key: ConfigKey, data: T) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(HostError::AlreadyExists(format!("config key {key}")));
        }
        self.entries.insert(key, data);
        Ok(())
    }

    pub fn get(&self, key: ConfigKey) -> Option<&T> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: ConfigKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigKey, &T)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type PassiveKeyMap = KeyMap<PassiveKey>;
pub type ActiveKeyMap = KeyMap<ActiveKey>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_duplicate_key_rejected() {
        let mut keys = ActiveKeyMap::new();
        keys.insert(1, ActiveKey::with_default(true)).unwrap();
        let err = keys.insert(1, ActiveKey::with_default(false)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(keys.get(1), Some(&ActiveKey::with_default(true)));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_typed_reads() {
        assert!(bool::from_config_value(ConfigValue::Bool(true)).unwrap());
        assert_eq!(u32::from_config_value(ConfigValue::Integer(3)).unwrap(), 3);
        assert_eq!(f64::from_config_value(ConfigValue::Integer(2)).unwrap(), 2.0);
        assert_eq!(
            PathBuf::from_config_value(ConfigValue::from("./log")).unwrap(),
            PathBuf::from("./log")
        );

        let err = u64::from_config_value(ConfigValue::Integer(-1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = bool::from_config_value(ConfigValue::from("yes")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_float_default_accepts_integer() {
        let default = ConfigValue::Float(1.5);
        assert!(default.accepts(&ConfigValue::Integer(2)));
        assert!(!ConfigValue::Integer(2).accepts(&ConfigValue::Float(1.5)));
        assert!(!ConfigValue::Bool(true).accepts(&ConfigValue::from("true")));
    }
}
