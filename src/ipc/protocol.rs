//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::StatusEvent;
use crate::host::{Bridge, HotkeyOutcome};

/// Requests from the input method framework to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current module status
    GetStatus,

    /// Run committed text through the commit filters
    Commit { text: String },

    /// A key combination was pressed (e.g. `"CTRL_ALT_T"`)
    KeyPressed { hotkey: String },

    /// A status indicator was clicked
    ClickStatus { name: String },

    /// The current input method language changed
    SetLanguage { language: Option<String> },

    /// An input method context became active or inactive
    SetInputMethod { active: bool },

    /// Reload the configuration file
    Reload,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to status change notifications
    Subscribe,
}

/// Responses from daemon to the framework
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current module status
    Status(ModuleStatus),

    /// Text to commit
    Committed { text: String },

    /// Whether the key press was consumed
    Key { consumed: bool },

    /// Status indicator value after a click
    StatusToggled { name: String, enabled: bool },

    /// Request handled, nothing to report
    Ok,

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "event", rename_all = "snake_case")]
pub enum Notification {
    /// Status event occurred
    StatusEvent(StatusEvent),
}

/// Full module status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStatus {
    /// Daemon version
    pub version: String,

    /// Whether commits are transformed
    pub enabled: bool,

    /// Whether the status indicator is shown
    pub visible: bool,

    /// Configured marker, alias names verbatim
    pub marker: String,

    /// Toggle hotkey bindings
    pub hotkey: String,

    /// Current input method language
    pub language: Option<String>,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl ModuleStatus {
    /// Snapshot a running module
    pub fn from_bridge(bridge: &Bridge, uptime_secs: u64) -> Self {
        let state = bridge.state();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            enabled: state.enabled(),
            visible: state.visible(),
            marker: state.marker().to_string(),
            hotkey: state.hotkey().to_string(),
            language: bridge.registry().language().map(str::to_string),
            uptime_secs,
        }
    }
}

impl From<HotkeyOutcome> for Response {
    fn from(outcome: HotkeyOutcome) -> Self {
        Response::Key {
            consumed: outcome == HotkeyOutcome::Consumed,
        }
    }
}
