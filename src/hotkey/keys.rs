//! Key combination descriptors
//!
//! Hotkeys are written the way fcitx writes them in configuration files:
//! modifiers followed by the key name, joined by underscores (`CTRL_ALT_T`).

use std::fmt;
use std::str::FromStr;

/// Tracks which modifier keys are part of a combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    /// Control key is held
    pub control: bool,
    /// Alt/Option key is held
    pub alt: bool,
    /// Shift key is held
    pub shift: bool,
    /// Super/Meta/Win key is held
    pub super_key: bool,
}

/// A single key combination, e.g. `CTRL_ALT_T`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: ModifierState,
    /// Upper-cased key name (`T`, `SPACE`, `F12`, ...)
    pub key: String,
}

/// Errors produced while parsing hotkey descriptors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("empty hotkey string")]
    Empty,

    #[error("no key specified in hotkey {0:?}")]
    MissingKey(String),

    #[error("multiple keys specified in hotkey {0:?}")]
    MultipleKeys(String),

    #[error("invalid key name {0:?}")]
    InvalidKey(String),

    #[error("at most two hotkeys can be bound, got {0}")]
    TooMany(usize),
}

impl Hotkey {
    /// Parse a combination like `CTRL_ALT_T` or `ctrl+shift+space`
    pub fn parse(text: &str) -> Result<Self, HotkeyError> {
        if text.trim().is_empty() {
            return Err(HotkeyError::Empty);
        }

        let mut modifiers = ModifierState::default();
        let mut key: Option<String> = None;

        let parts = text
            .split(|c: char| c == '_' || c == '+')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty());

        for part in parts {
            match part.as_str() {
                "CTRL" | "CONTROL" => modifiers.control = true,
                "ALT" | "OPTION" => modifiers.alt = true,
                "SHIFT" => modifiers.shift = true,
                "SUPER" | "META" | "WIN" => modifiers.super_key = true,
                _ => {
                    if key.is_some() {
                        return Err(HotkeyError::MultipleKeys(text.to_string()));
                    }
                    if !part.chars().all(|c| c.is_ascii_graphic()) {
                        return Err(HotkeyError::InvalidKey(part));
                    }
                    key = Some(part);
                }
            }
        }

        match key {
            Some(key) => Ok(Self { modifiers, key }),
            None => Err(HotkeyError::MissingKey(text.to_string())),
        }
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.control {
            f.write_str("CTRL_")?;
        }
        if self.modifiers.alt {
            f.write_str("ALT_")?;
        }
        if self.modifiers.shift {
            f.write_str("SHIFT_")?;
        }
        if self.modifiers.super_key {
            f.write_str("SUPER_")?;
        }
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fcitx_style() {
        let hotkey = Hotkey::parse("CTRL_ALT_T").unwrap();
        assert_eq!(hotkey.key, "T");
        assert!(hotkey.modifiers.control);
        assert!(hotkey.modifiers.alt);
        assert!(!hotkey.modifiers.shift);
        assert!(!hotkey.modifiers.super_key);
    }

    #[test]
    fn test_parse_plus_separated_lowercase() {
        let hotkey = Hotkey::parse("ctrl+shift+space").unwrap();
        assert_eq!(hotkey.key, "SPACE");
        assert!(hotkey.modifiers.control);
        assert!(hotkey.modifiers.shift);
    }

    #[test]
    fn test_bare_key() {
        let hotkey = Hotkey::parse("F12").unwrap();
        assert_eq!(hotkey.modifiers, ModifierState::default());
        assert_eq!(hotkey.to_string(), "F12");
    }

    #[test]
    fn test_display_is_canonical() {
        let hotkey = Hotkey::parse("super+shift+alt+ctrl+k").unwrap();
        assert_eq!(hotkey.to_string(), "CTRL_ALT_SHIFT_SUPER_K");
        assert_eq!(Hotkey::parse(&hotkey.to_string()).unwrap(), hotkey);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Hotkey::parse(""), Err(HotkeyError::Empty));
        assert!(matches!(Hotkey::parse("CTRL_"), Err(HotkeyError::MissingKey(_))));
        assert!(matches!(Hotkey::parse("CTRL_SHIFT"), Err(HotkeyError::MissingKey(_))));
        assert!(matches!(Hotkey::parse("CTRL_A_B"), Err(HotkeyError::MultipleKeys(_))));
        assert!(matches!(Hotkey::parse("CTRL_中"), Err(HotkeyError::InvalidKey(_))));
    }
}
