//! Configuration file access.

use std::fs;
use std::path::Path;

use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read a TOML document from disk.
pub fn load_document(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Write a TOML document, replacing the file in one rename.
pub fn save_document(path: &Path, document: &toml::Table) -> Result<(), ConfigError> {
    let content = toml::to_string(document).map_err(ConfigError::Serialize)?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, content).map_err(ConfigError::Io)?;
    fs::rename(&tmp, path).map_err(ConfigError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.toml");

        let mut group = toml::Table::new();
        group.insert("LogFile".into(), toml::Value::String("host.log".into()));
        let mut document = toml::Table::new();
        document.insert("Logging".into(), toml::Value::Table(group));

        save_document(&path, &document).unwrap();
        assert_eq!(load_document(&path).unwrap(), document);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[Logging\nLogFile = ").unwrap();
        assert!(matches!(load_document(&path), Err(ConfigError::Parse(_))));
    }
}
