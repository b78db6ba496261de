//! Status events broadcast by the host
//!
//! Emitted whenever a status indicator changes visibility or value, and
//! after a configuration reload.

use serde::{Deserialize, Serialize};

/// Events pushed to subscribed clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A status indicator was toggled
    StatusChanged {
        name: String,
        /// Value reported by the indicator after the toggle
        enabled: bool,
    },

    /// A status indicator was shown or hidden
    VisibilityChanged { name: String, visible: bool },

    /// The module configuration was reloaded
    ConfigReloaded {
        enabled: bool,
        marker: String,
    },
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusEvent::StatusChanged { name, enabled } => {
                write!(f, "STATUS_CHANGED {} ({})", name, if *enabled { "on" } else { "off" })
            }
            StatusEvent::VisibilityChanged { name, visible } => {
                write!(f, "VISIBILITY_CHANGED {} ({})", name, if *visible { "shown" } else { "hidden" })
            }
            StatusEvent::ConfigReloaded { .. } => write!(f, "CONFIG_RELOADED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StatusEvent::StatusChanged {
            name: "tsundere".to_string(),
            enabled: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("status_changed"));
        assert!(json.contains("tsundere"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"visibility_changed","name":"tsundere","visible":false}"#;
        let event: StatusEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            StatusEvent::VisibilityChanged {
                name: "tsundere".to_string(),
                visible: false
            }
        );
    }

    #[test]
    fn test_display() {
        let event = StatusEvent::VisibilityChanged {
            name: "tsundere".to_string(),
            visible: true,
        };
        assert_eq!(event.to_string(), "VISIBILITY_CHANGED tsundere (shown)");
    }
}
