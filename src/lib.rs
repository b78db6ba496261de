//! fcitx-tsundere: commit filter that marks every committed character
//!
//! While enabled, every string the input method commits is rewritten so
//! that each character is followed by a configured marker. The status
//! indicator (and with it the toggle hotkey) is only shown for specific
//! Chinese input method languages such as `zh_CN`.
//!
//! - [`transform`]: the pure commit rewrite
//! - [`state`]: module state and host callbacks
//! - [`host`]: host boundary plus an in-process host
//! - [`config`]: persisted options and schema descriptor
//! - [`ipc`]: socket surface used by the daemon binary

pub mod config;
pub mod events;
pub mod hotkey;
pub mod host;
pub mod ipc;
pub mod lifecycle;
pub mod marker;
pub mod state;
pub mod transform;

pub use config::{ConfigError, Settings, TsundereConfig};
pub use host::{Bridge, Host, HotkeyOutcome};
pub use marker::Marker;
pub use state::TsundereState;
pub use transform::transform;
