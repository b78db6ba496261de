//! Boundary between the module and the input-method framework hosting it
//!
//! The module never calls into the framework except through [`Host`]. Every
//! integration point is a plain function value registered once from
//! [`TsundereState::create`]; the host later invokes it with the state
//! passed by reference.

mod bridge;
mod registry;

use crate::hotkey::HotkeyPair;
use crate::state::TsundereState;

pub use bridge::Bridge;
pub use registry::{Registry, StatusEntry};

/// Name of the status indicator owned by this module
pub const STATUS_NAME: &str = "tsundere";

/// Translation domain for user-visible strings
pub const TEXT_DOMAIN: &str = "fcitx-tsundere";

/// Context key carrying the language of the current input method
pub const CONTEXT_IM_LANGUAGE: &str = "CONTEXT_IM_LANGUAGE";

/// What the host should do with a key after a hotkey handler ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyOutcome {
    /// The key was handled; do not forward it
    Consumed,
    /// The key was not handled; continue default processing
    PassThrough,
}

pub type HotkeyHandler = fn(&TsundereState, &mut dyn Host) -> HotkeyOutcome;
pub type CommitFilter = fn(&TsundereState, &dyn Host, &str) -> Option<String>;
pub type StatusToggle = fn(&mut TsundereState);
pub type StatusQuery = fn(&TsundereState) -> bool;
pub type ContextCallback = fn(&mut TsundereState, &mut dyn Host, Option<&str>);

/// Hotkey filter registration
#[derive(Clone)]
pub struct HotkeyHook {
    /// Current bindings; read on every key press so reloads take effect
    pub bindings: fn(&TsundereState) -> &HotkeyPair,
    pub handle: HotkeyHandler,
}

/// Commit filter registration. `None` from the filter keeps the text.
#[derive(Clone)]
pub struct CommitFilterHook {
    pub filter: CommitFilter,
}

/// Status indicator registration
#[derive(Clone)]
pub struct StatusHook {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    /// Invoked on click and on refresh requests
    pub toggle: StatusToggle,
    pub get: StatusQuery,
}

/// Subscription to a context value broadcast by the host
#[derive(Clone)]
pub struct ContextWatcher {
    pub key: String,
    pub notify: ContextCallback,
}

/// Services the host framework provides to the module.
pub trait Host {
    fn register_hotkey_filter(&mut self, hook: HotkeyHook);

    fn register_commit_filter(&mut self, hook: CommitFilterHook);

    fn register_status(&mut self, hook: StatusHook);

    fn watch_context(&mut self, watcher: ContextWatcher);

    /// Whether an input method context is currently active
    fn has_active_input_method(&self) -> bool;

    fn is_status_visible(&self, name: &str) -> bool;

    fn set_status_visible(&mut self, name: &str, visible: bool);

    /// Ask the host to refresh a status indicator, which invokes its toggle
    /// handler once the current callback has returned.
    fn update_status(&mut self, name: &str);

    /// Look up a translated user-visible string
    fn translate(&self, _domain: &str, msgid: &str) -> String {
        msgid.to_string()
    }
}
