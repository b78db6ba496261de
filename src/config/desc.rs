//! Configuration schema descriptor
//!
//! The descriptor (`fcitx-tsundere.desc`) lists every option the module
//! understands together with its type and default value:
//!
//! ```toml
//! [[option]]
//! group = "Tsundere"
//! name = "Marker"
//! type = "String"
//! default = "juhua"
//! ```
//!
//! Binding a configuration file against the descriptor takes each option
//! from the file when it is present and well-typed, and from the descriptor
//! default otherwise. A descriptor that is missing an option or carries an
//! ill-typed default is a schema error.

use serde::Deserialize;
use tracing::warn;

use super::{ConfigError, TsundereConfig, GROUP};
use crate::hotkey::HotkeyPair;
use crate::marker::Marker;

/// Value type of a configuration option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OptionType {
    Boolean,
    String,
    Hotkey,
}

/// One option entry of the descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct OptionDesc {
    pub group: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    pub default: toml::Value,
    #[serde(default)]
    pub description: String,
}

/// Parsed schema descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDesc {
    #[serde(rename = "option", default)]
    pub options: Vec<OptionDesc>,
}

impl ConfigDesc {
    /// Parse descriptor text. Fails if the text is not valid TOML or if the
    /// options this module binds are missing or have unusable defaults.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let desc: ConfigDesc = toml::from_str(text).map_err(ConfigError::SchemaParse)?;
        desc.defaults()?;
        Ok(desc)
    }

    /// Look up an option of the `Tsundere` group
    pub fn option(&self, name: &str) -> Option<&OptionDesc> {
        self.options
            .iter()
            .find(|opt| opt.group == GROUP && opt.name == name)
    }

    /// The configuration made of descriptor defaults only
    pub fn defaults(&self) -> Result<TsundereConfig, ConfigError> {
        self.bind(None)
    }

    /// Bind a parsed configuration file against the descriptor.
    ///
    /// Only schema problems are errors; a bad value in the file falls back to
    /// the option's default.
    pub fn bind(&self, file: Option<&toml::Table>) -> Result<TsundereConfig, ConfigError> {
        let group = file.and_then(|table| match table.get(GROUP) {
            Some(toml::Value::Table(group)) => Some(group),
            Some(_) => {
                warn!(group = GROUP, "configuration group is not a table, ignoring");
                None
            }
            None => None,
        });

        if let Some(group) = group {
            for key in group.keys() {
                if self.option(key).is_none() {
                    warn!(group = GROUP, key = %key, "unknown configuration key");
                }
            }
        }

        let enabled = self.value("Enabled", OptionType::Boolean, group, |v| v.as_bool())?;
        let marker = self.value("Marker", OptionType::String, group, |v| {
            v.as_str().and_then(|s| Marker::new(s).ok())
        })?;
        let hotkey = self.value("Hotkey", OptionType::Hotkey, group, |v| {
            v.as_str().and_then(|s| HotkeyPair::parse(s).ok())
        })?;

        Ok(TsundereConfig {
            enabled,
            marker,
            hotkey,
        })
    }

    fn value<T>(
        &self,
        name: &str,
        kind: OptionType,
        group: Option<&toml::Table>,
        convert: impl Fn(&toml::Value) -> Option<T>,
    ) -> Result<T, ConfigError> {
        let opt = self
            .option(name)
            .ok_or_else(|| ConfigError::SchemaInvalid(format!("option {}/{} is not described", GROUP, name)))?;

        if opt.kind != kind {
            return Err(ConfigError::SchemaInvalid(format!(
                "option {}/{} must have type {:?}, found {:?}",
                GROUP, name, kind, opt.kind
            )));
        }

        if let Some(raw) = group.and_then(|g| g.get(name)) {
            match convert(raw) {
                Some(value) => return Ok(value),
                None => warn!(option = name, value = %raw, "invalid configuration value, using default"),
            }
        }

        convert(&opt.default).ok_or_else(|| {
            ConfigError::SchemaInvalid(format!(
                "default {} of option {}/{} is not a valid {:?}",
                opt.default, GROUP, name, kind
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: &str = include_str!("../../data/fcitx-tsundere.desc");

    #[test]
    fn test_defaults() {
        let desc = ConfigDesc::parse(DESC).unwrap();
        let config = desc.defaults().unwrap();
        assert!(!config.enabled);
        assert_eq!(config.marker.as_str(), "juhua");
        assert_eq!(config.hotkey.to_string(), "CTRL_ALT_T");
    }

    #[test]
    fn test_bind_file_values() {
        let desc = ConfigDesc::parse(DESC).unwrap();
        let file: toml::Table = toml::from_str(
            r#"
[Tsundere]
Enabled = true
Marker = "!"
Hotkey = "CTRL_SHIFT_T F2"
"#,
        )
        .unwrap();

        let config = desc.bind(Some(&file)).unwrap();
        assert!(config.enabled);
        assert_eq!(config.marker.as_str(), "!");
        assert_eq!(config.hotkey.to_string(), "CTRL_SHIFT_T F2");
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let desc = ConfigDesc::parse(DESC).unwrap();
        let file: toml::Table = toml::from_str(
            r#"
[Tsundere]
Enabled = "yes"
Marker = ""
Hotkey = "CTRL_"
Extra = 1
"#,
        )
        .unwrap();

        let config = desc.bind(Some(&file)).unwrap();
        assert_eq!(config, desc.defaults().unwrap());
    }

    #[test]
    fn test_missing_option_is_schema_error() {
        let text = DESC.replace("name = \"Marker\"", "name = \"Other\"");
        let err = ConfigDesc::parse(&text).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaInvalid(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let text = DESC.replace("type = \"Boolean\"", "type = \"String\"");
        assert!(matches!(
            ConfigDesc::parse(&text),
            Err(ConfigError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_empty_marker_default_is_schema_error() {
        let text = DESC.replace("default = \"juhua\"", "default = \"\"");
        assert!(matches!(
            ConfigDesc::parse(&text),
            Err(ConfigError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_unparsable_schema() {
        assert!(matches!(
            ConfigDesc::parse("[[option]\n"),
            Err(ConfigError::SchemaParse(_))
        ));
    }
}
