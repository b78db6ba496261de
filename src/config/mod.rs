//! Configuration loading and persistence
//!
//! Two layers live here:
//! - [`Settings`]: where the daemon finds its files, resolved from the
//!   environment with platform defaults
//! - [`TsundereConfig`]: the persisted module options (`Enabled`, `Marker`,
//!   `Hotkey`), bound against the schema descriptor in [`desc`] and stored
//!   through a [`ConfigStore`]

mod desc;
mod store;

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::hotkey::{Hotkey, HotkeyPair, ModifierState};
use crate::marker::Marker;

pub use desc::{ConfigDesc, OptionDesc, OptionType};
pub use store::{ConfigStore, FileStore};

/// Logical name of the user configuration file
pub const CONFIG_FILE: &str = "fcitx-tsundere.config";

/// Logical name of the schema descriptor
pub const DESC_FILE: &str = "fcitx-tsundere.desc";

/// Group holding every option of this module
pub const GROUP: &str = "Tsundere";

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// The schema descriptor does not exist.
    #[error("schema descriptor {path} not found")]
    SchemaMissing { path: PathBuf },

    /// The schema descriptor exists but could not be read.
    #[error("failed to read schema descriptor {path}: {source}")]
    SchemaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema descriptor is not valid TOML.
    #[error("failed to parse schema descriptor: {0}")]
    SchemaParse(#[source] toml::de::Error),

    /// The schema descriptor does not describe the options this module binds.
    #[error("invalid schema descriptor: {0}")]
    SchemaInvalid(String),

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Schema errors abort module creation; everything else is recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConfigError::SchemaMissing { .. }
                | ConfigError::SchemaUnreadable { .. }
                | ConfigError::SchemaParse(_)
                | ConfigError::SchemaInvalid(_)
        )
    }
}

/// Persisted module options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsundereConfig {
    pub enabled: bool,
    pub marker: Marker,
    pub hotkey: HotkeyPair,
}

impl Default for TsundereConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            marker: Marker::default(),
            hotkey: HotkeyPair::single(Hotkey {
                modifiers: ModifierState {
                    control: true,
                    alt: true,
                    ..ModifierState::default()
                },
                key: "T".to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
struct ConfigFile<'a> {
    #[serde(rename = "Tsundere")]
    tsundere: ConfigGroup<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigGroup<'a> {
    enabled: bool,
    marker: &'a Marker,
    hotkey: &'a HotkeyPair,
}

impl TsundereConfig {
    /// Render the configuration file text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let file = ConfigFile {
            tsundere: ConfigGroup {
                enabled: self.enabled,
                marker: &self.marker,
                hotkey: &self.hotkey,
            },
        };
        Ok(toml::to_string_pretty(&file)?)
    }
}

/// Daemon file locations
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `fcitx-tsundere.config`
    pub config_dir: PathBuf,

    /// Directory holding `fcitx-tsundere.desc`
    pub desc_dir: PathBuf,

    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,
}

impl Settings {
    /// Load settings from environment and defaults
    ///
    /// - `TSUNDERE_CONFIG_DIR` overrides `<config dir>/fcitx/conf`
    /// - `TSUNDERE_DESC_DIR` overrides `/usr/share/fcitx/configdesc`
    /// - `TSUNDERE_SOCKET` overrides `<data dir>/fcitx-tsundere/daemon.sock`
    pub fn load() -> Result<Self> {
        Ok(Self::resolve(
            |key| std::env::var_os(key),
            dirs::config_dir(),
            dirs::data_dir(),
        )?)
    }

    /// Resolve settings from an environment lookup and the platform
    /// config/data directories
    fn resolve(
        env: impl Fn(&str) -> Option<OsString>,
        platform_config_dir: Option<PathBuf>,
        platform_data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config_dir = match env("TSUNDERE_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => platform_config_dir
                .ok_or(ConfigError::NoPlatformConfigDir)?
                .join("fcitx")
                .join("conf"),
        };

        let desc_dir = env("TSUNDERE_DESC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/usr/share/fcitx/configdesc"));

        let data_dir = platform_data_dir
            .ok_or(ConfigError::NoPlatformConfigDir)?
            .join("fcitx-tsundere");

        let socket_path = env("TSUNDERE_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        Ok(Self {
            config_dir,
            desc_dir,
            socket_path,
            data_dir,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// File store for the module configuration
    pub fn store(&self) -> FileStore {
        FileStore::new(self.config_dir.join(CONFIG_FILE), self.desc_dir.join(DESC_FILE))
    }
}
