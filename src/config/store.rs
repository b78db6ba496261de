//! Backing storage for the configuration file and schema descriptor

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ConfigDesc, ConfigError, TsundereConfig};

/// Where the module reads its schema and reads/writes its configuration.
pub trait ConfigStore {
    /// Resolve and parse the schema descriptor
    fn desc(&self) -> Result<ConfigDesc, ConfigError>;

    /// Read the configuration file. `Ok(None)` means it does not exist yet.
    fn read(&self) -> Result<Option<String>, ConfigError>;

    /// Replace the configuration file with `config`
    fn write(&self, config: &TsundereConfig) -> Result<(), ConfigError>;
}

/// Configuration stored as files on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    config_path: PathBuf,
    desc_path: PathBuf,
}

impl FileStore {
    pub fn new(config_path: PathBuf, desc_path: PathBuf) -> Self {
        Self {
            config_path,
            desc_path,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl ConfigStore for FileStore {
    fn desc(&self) -> Result<ConfigDesc, ConfigError> {
        let text = match std::fs::read_to_string(&self.desc_path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::SchemaMissing {
                    path: self.desc_path.clone(),
                })
            }
            Err(source) => {
                return Err(ConfigError::SchemaUnreadable {
                    path: self.desc_path.clone(),
                    source,
                })
            }
        };
        ConfigDesc::parse(&text)
    }

    fn read(&self) -> Result<Option<String>, ConfigError> {
        debug!(path = ?self.config_path, "load config file");
        match std::fs::read_to_string(&self.config_path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Io {
                path: self.config_path.clone(),
                source,
            }),
        }
    }

    fn write(&self, config: &TsundereConfig) -> Result<(), ConfigError> {
        debug!(path = ?self.config_path, "save config file");
        let text = config.to_toml()?;
        let io_err = |source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        };

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.config_path, text).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Marker;

    fn store_in(dir: &Path) -> FileStore {
        FileStore::new(
            dir.join("conf").join(super::super::CONFIG_FILE),
            dir.join(super::super::DESC_FILE),
        )
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_missing_desc_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.desc().unwrap_err();
        assert!(matches!(err, ConfigError::SchemaMissing { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unreadable_desc_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::create_dir(dir.path().join(super::super::DESC_FILE)).unwrap();

        let err = store.desc().unwrap_err();
        assert!(matches!(err, ConfigError::SchemaUnreadable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_write_creates_parent_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let config = TsundereConfig {
            marker: Marker::new("~").unwrap(),
            ..TsundereConfig::default()
        };

        store.write(&config).unwrap();

        let text = store.read().unwrap().unwrap();
        assert!(text.contains("Marker = \"~\""));
    }
}
