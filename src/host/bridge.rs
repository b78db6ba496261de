//! Dispatches host events to the hooks registered by the module

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{Host, HotkeyOutcome, Registry, CONTEXT_IM_LANGUAGE};
use crate::config::{ConfigError, ConfigStore};
use crate::events::StatusEvent;
use crate::hotkey::Hotkey;
use crate::state::TsundereState;

/// A module instance together with the host that drives it
pub struct Bridge {
    state: TsundereState,
    registry: Registry,
}

impl Bridge {
    /// Create the module against a fresh registry
    pub fn create(
        store: Box<dyn ConfigStore + Send>,
        event_tx: broadcast::Sender<StatusEvent>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Registry::new(event_tx);
        let state = TsundereState::create(&mut registry, store)?;
        Ok(Self { state, registry })
    }

    pub fn state(&self) -> &TsundereState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run committed text through every commit filter in registration order
    pub fn commit(&mut self, text: &str) -> String {
        let filters: Vec<_> = self.registry.commit_filters.iter().map(|h| h.filter).collect();

        let mut text = text.to_string();
        for filter in filters {
            if let Some(filtered) = filter(&self.state, &self.registry, &text) {
                text = filtered;
            }
        }
        text
    }

    /// Offer a key press to the hotkey filters whose bindings match it
    pub fn key_pressed(&mut self, pressed: &Hotkey) -> HotkeyOutcome {
        let handlers: Vec<_> = self
            .registry
            .hotkey_hooks
            .iter()
            .filter(|hook| (hook.bindings)(&self.state).matches(pressed))
            .map(|hook| hook.handle)
            .collect();

        for handle in handlers {
            let outcome = handle(&self.state, &mut self.registry);
            self.flush_status_updates();
            if outcome == HotkeyOutcome::Consumed {
                debug!(hotkey = %pressed, "hotkey consumed");
                return outcome;
            }
        }

        HotkeyOutcome::PassThrough
    }

    /// Click a status indicator. Returns false for unknown names.
    pub fn click_status(&mut self, name: &str) -> bool {
        if self.registry.status(name).is_none() {
            return false;
        }
        self.registry.update_status(name);
        self.flush_status_updates();
        true
    }

    /// Broadcast a new input method language to the context watchers
    pub fn set_language(&mut self, language: Option<String>) {
        self.registry.set_language(language.clone());

        let watchers: Vec<_> = self
            .registry
            .watchers
            .iter()
            .filter(|w| w.key == CONTEXT_IM_LANGUAGE)
            .map(|w| w.notify)
            .collect();

        for notify in watchers {
            notify(&mut self.state, &mut self.registry, language.as_deref());
        }
    }

    pub fn set_input_method_active(&mut self, active: bool) {
        self.registry.set_input_method_active(active);
    }

    /// Reload the module configuration. `ConfigReloaded` is emitted only
    /// when the new values were applied.
    pub fn reload(&mut self) -> bool {
        info!("configuration reload requested");
        if !self.state.reload() {
            return false;
        }
        self.registry.emit(StatusEvent::ConfigReloaded {
            enabled: self.state.enabled(),
            marker: self.state.marker().to_string(),
        });
        true
    }

    /// Invoke the toggle handler of every status queued for refresh
    fn flush_status_updates(&mut self) {
        for name in std::mem::take(&mut self.registry.pending_updates) {
            let Some(entry) = self.registry.status(&name) else {
                continue;
            };
            let (toggle, get) = (entry.hook.toggle, entry.hook.get);

            toggle(&mut self.state);
            self.registry.emit(StatusEvent::StatusChanged {
                enabled: get(&self.state),
                name,
            });
        }
    }
}
