//! Read access to keyed configuration.

use crate::config::schema::{ConfigKey, ConfigValue, FromConfigValue};
use crate::error::Result;

/// A source of configuration values addressed by key id.
///
/// Reading an id the store was not set up with fails with `NotFound`; reading
/// a known id that has neither a stored value nor a default fails with
/// `DoesNotExist`.
pub trait ConfigStore: Send + Sync {
    fn value(&self, key: ConfigKey) -> Result<ConfigValue>;
}

/// Typed reads on top of [`ConfigStore::value`].
pub trait ConfigStoreExt: ConfigStore {
    fn get<T: FromConfigValue>(&self, key: ConfigKey) -> Result<T> {
        T::from_config_value(self.value(key)?)
    }
}

impl<S: ConfigStore + ?Sized> ConfigStoreExt for S {}
