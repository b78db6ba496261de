//! Pair of hotkeys bound to one action

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::keys::{Hotkey, HotkeyError};

/// Up to two key combinations that trigger the same action.
///
/// Serialized as the space-separated list fcitx uses, e.g.
/// `"CTRL_ALT_T CTRL_SHIFT_T"`. An empty string leaves the action unbound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct HotkeyPair {
    primary: Option<Hotkey>,
    secondary: Option<Hotkey>,
}

impl HotkeyPair {
    pub fn new(primary: Option<Hotkey>, secondary: Option<Hotkey>) -> Self {
        // keep a lone binding in the first slot
        match (primary, secondary) {
            (None, Some(hotkey)) => Self {
                primary: Some(hotkey),
                secondary: None,
            },
            (primary, secondary) => Self { primary, secondary },
        }
    }

    pub fn single(hotkey: Hotkey) -> Self {
        Self::new(Some(hotkey), None)
    }

    /// Parse a space-separated list of at most two combinations
    pub fn parse(text: &str) -> Result<Self, HotkeyError> {
        let hotkeys = text
            .split_whitespace()
            .map(Hotkey::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if hotkeys.len() > 2 {
            return Err(HotkeyError::TooMany(hotkeys.len()));
        }

        let mut iter = hotkeys.into_iter();
        Ok(Self::new(iter.next(), iter.next()))
    }

    /// Bound combinations, in order
    pub fn iter(&self) -> impl Iterator<Item = &Hotkey> {
        self.primary.iter().chain(self.secondary.iter())
    }

    pub fn is_unbound(&self) -> bool {
        self.primary.is_none()
    }

    /// Check whether a pressed combination triggers this binding
    pub fn matches(&self, pressed: &Hotkey) -> bool {
        self.iter().any(|hotkey| hotkey == pressed)
    }
}

impl FromStr for HotkeyPair {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<HotkeyPair> for String {
    fn from(pair: HotkeyPair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for HotkeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for hotkey in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", hotkey)?;
            first = false;
        }
        Ok(())
    }
}
