//! Marker strings inserted after committed characters

use std::fmt;

use serde::Serialize;

/// Reserved marker name that stands for [`JUHUA`].
pub const JUHUA_ALIAS: &str = "juhua";

/// U+0489 COMBINING CYRILLIC MILLIONS SIGN
pub const JUHUA: &str = "\u{489}";

/// A non-empty marker as configured by the user.
///
/// The configured text is kept verbatim so it round-trips through the
/// configuration file; [`Marker::effective`] gives the text actually inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Marker(String);

/// Returned when an empty marker is configured
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("marker must not be empty")]
pub struct EmptyMarker;

impl Marker {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyMarker> {
        let value = value.into();
        if value.is_empty() {
            return Err(EmptyMarker);
        }
        Ok(Self(value))
    }

    /// The configured text, alias names included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text inserted into commits
    pub fn effective(&self) -> &str {
        if self.0 == JUHUA_ALIAS {
            JUHUA
        } else {
            &self.0
        }
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self(JUHUA_ALIAS.to_string())
    }
}

impl From<Marker> for String {
    fn from(marker: Marker) -> Self {
        marker.0
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
