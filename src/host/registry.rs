//! In-process host implementation
//!
//! Records the hooks a module registers and keeps the host-side view of
//! status indicators, the active input method and its language.

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{CommitFilterHook, ContextWatcher, Host, HotkeyHook, StatusHook};
use crate::events::StatusEvent;

/// A registered status indicator and its current visibility
#[derive(Clone)]
pub struct StatusEntry {
    pub hook: StatusHook,
    pub visible: bool,
}

/// Hook table and host state
pub struct Registry {
    pub(super) hotkey_hooks: Vec<HotkeyHook>,
    pub(super) commit_filters: Vec<CommitFilterHook>,
    pub(super) statuses: Vec<StatusEntry>,
    pub(super) watchers: Vec<ContextWatcher>,
    /// Refresh requests queued by `update_status`
    pub(super) pending_updates: Vec<String>,
    im_active: bool,
    language: Option<String>,
    event_tx: broadcast::Sender<StatusEvent>,
}

impl Registry {
    pub fn new(event_tx: broadcast::Sender<StatusEvent>) -> Self {
        Self {
            hotkey_hooks: Vec::new(),
            commit_filters: Vec::new(),
            statuses: Vec::new(),
            watchers: Vec::new(),
            pending_updates: Vec::new(),
            im_active: false,
            language: None,
            event_tx,
        }
    }

    pub fn status(&self, name: &str) -> Option<&StatusEntry> {
        self.statuses.iter().find(|s| s.hook.name == name)
    }

    pub fn statuses(&self) -> &[StatusEntry] {
        &self.statuses
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub(super) fn set_language(&mut self, language: Option<String>) {
        self.language = language;
    }

    pub(super) fn set_input_method_active(&mut self, active: bool) {
        if self.im_active != active {
            info!(active, "input method context changed");
        }
        self.im_active = active;
    }

    pub(super) fn emit(&self, event: StatusEvent) {
        debug!(%event, "emitting status event");
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

impl Host for Registry {
    fn register_hotkey_filter(&mut self, hook: HotkeyHook) {
        debug!("hotkey filter registered");
        self.hotkey_hooks.push(hook);
    }

    fn register_commit_filter(&mut self, hook: CommitFilterHook) {
        debug!("commit filter registered");
        self.commit_filters.push(hook);
    }

    fn register_status(&mut self, hook: StatusHook) {
        info!(name = %hook.name, description = %hook.short_description, "status registered");
        self.statuses.push(StatusEntry {
            hook,
            visible: true,
        });
    }

    fn watch_context(&mut self, watcher: ContextWatcher) {
        debug!(key = %watcher.key, "context watcher registered");
        self.watchers.push(watcher);
    }

    fn has_active_input_method(&self) -> bool {
        self.im_active
    }

    fn is_status_visible(&self, name: &str) -> bool {
        self.status(name).map(|s| s.visible).unwrap_or(false)
    }

    fn set_status_visible(&mut self, name: &str, visible: bool) {
        let Some(entry) = self.statuses.iter_mut().find(|s| s.hook.name == name) else {
            debug!(name, "visibility change for unknown status");
            return;
        };

        if entry.visible != visible {
            entry.visible = visible;
            self.emit(StatusEvent::VisibilityChanged {
                name: name.to_string(),
                visible,
            });
        }
    }

    fn update_status(&mut self, name: &str) {
        self.pending_updates.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TsundereState;

    fn status_hook(name: &str) -> StatusHook {
        StatusHook {
            name: name.to_string(),
            short_description: String::new(),
            long_description: String::new(),
            toggle: TsundereState::toggle_enabled,
            get: TsundereState::enabled,
        }
    }

    #[test]
    fn test_visibility_events() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut registry = Registry::new(tx);
        registry.register_status(status_hook("tsundere"));

        assert!(registry.is_status_visible("tsundere"));
        registry.set_status_visible("tsundere", true);
        assert!(rx.try_recv().is_err());

        registry.set_status_visible("tsundere", false);
        assert!(!registry.is_status_visible("tsundere"));
        assert_eq!(
            rx.try_recv().unwrap(),
            StatusEvent::VisibilityChanged {
                name: "tsundere".to_string(),
                visible: false
            }
        );
    }

    #[test]
    fn test_unknown_status() {
        let (tx, _rx) = broadcast::channel(16);
        let mut registry = Registry::new(tx);
        assert!(!registry.is_status_visible("other"));
        registry.set_status_visible("other", true);
        assert!(!registry.is_status_visible("other"));
    }

    #[test]
    fn test_update_status_is_queued() {
        let (tx, _rx) = broadcast::channel(16);
        let mut registry = Registry::new(tx);
        registry.update_status("tsundere");
        assert_eq!(registry.pending_updates, vec!["tsundere".to_string()]);
    }
}
