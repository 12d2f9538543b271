//! Configuration keys and module ids of the example application.

use crate::config::ConfigKey;
use crate::modules::ModuleId;

/// Passive configuration entries.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassiveKeys {
    LogFolder,
    LogFile,
    MaxLogFileSize,
    MaxLogFiles,
    ActiveConfigPath,
    ActiveConfigGroup,
    ActiveConfigWatch,
    LibraryFolder,
}

impl PassiveKeys {
    pub const fn id(self) -> ConfigKey {
        self as ConfigKey
    }
}

/// Active configuration entries: the installed/enabled flag of each module.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveKeys {
    StaticModule1Installed,
    StaticModule1Enabled,
    StaticModule2Installed,
    StaticModule2Enabled,
    DynamicModule1Installed,
    DynamicModule1Enabled,
    DynamicModule2Installed,
    DynamicModule2Enabled,
}

impl ActiveKeys {
    pub const fn id(self) -> ConfigKey {
        self as ConfigKey
    }
}

pub const STATIC_MODULE_1: ModuleId = 1;
pub const STATIC_MODULE_2: ModuleId = 2;
pub const DYNAMIC_MODULE_1: ModuleId = 3;
pub const DYNAMIC_MODULE_2: ModuleId = 4;

/// Logical id of the example module library.
pub const EXAMPLE_LIBRARY_ID: &str = "example-module";
/// Crate name of the example module library, without platform decoration.
pub const EXAMPLE_LIBRARY_NAME: &str = "example_module";
pub const EXAMPLE_OBJECT_1: &str = "example-module-1";
pub const EXAMPLE_OBJECT_2: &str = "example-module-2";

/// Flag keys, module id and name of every example module.
pub struct ModuleKeys {
    pub id: ModuleId,
    pub name: &'static str,
    pub installed: ActiveKeys,
    pub enabled: ActiveKeys,
}

pub const STATIC_MODULES: [ModuleKeys; 2] = [
    ModuleKeys {
        id: STATIC_MODULE_1,
        name: "static-module-1",
        installed: ActiveKeys::StaticModule1Installed,
        enabled: ActiveKeys::StaticModule1Enabled,
    },
    ModuleKeys {
        id: STATIC_MODULE_2,
        name: "static-module-2",
        installed: ActiveKeys::StaticModule2Installed,
        enabled: ActiveKeys::StaticModule2Enabled,
    },
];

/// Dynamic modules; `name` is the object id inside the example library.
pub const DYNAMIC_MODULES: [ModuleKeys; 2] = [
    ModuleKeys {
        id: DYNAMIC_MODULE_1,
        name: EXAMPLE_OBJECT_1,
        installed: ActiveKeys::DynamicModule1Installed,
        enabled: ActiveKeys::DynamicModule1Enabled,
    },
    ModuleKeys {
        id: DYNAMIC_MODULE_2,
        name: EXAMPLE_OBJECT_2,
        installed: ActiveKeys::DynamicModule2Installed,
        enabled: ActiveKeys::DynamicModule2Enabled,
    },
];
