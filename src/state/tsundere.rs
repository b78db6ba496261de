//! Module state and host callbacks
//!
//! Holds the persisted options plus the derived status visibility, and
//! decides for every host callback whether the commit transform applies.

use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConfigStore, TsundereConfig};
use crate::hotkey::HotkeyPair;
use crate::host::{
    CommitFilterHook, ContextWatcher, Host, HotkeyHook, HotkeyOutcome, StatusHook,
    CONTEXT_IM_LANGUAGE, STATUS_NAME, TEXT_DOMAIN,
};
use crate::marker::Marker;
use crate::transform::transform;

/// Check whether a language code names a specific Chinese locale
/// (`zh_CN`, `zh_TW`, ...). The bare `zh` does not count.
pub fn is_chinese_variant(language: Option<&str>) -> bool {
    matches!(language, Some(lang) if lang.starts_with("zh") && lang.len() > 2)
}

/// State of one module instance
pub struct TsundereState {
    enabled: bool,
    marker: Marker,
    hotkey: HotkeyPair,
    /// Derived from the input method language, never persisted
    visible: bool,
    store: Box<dyn ConfigStore + Send>,
}

impl std::fmt::Debug for TsundereState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsundereState")
            .field("enabled", &self.enabled)
            .field("marker", &self.marker)
            .field("hotkey", &self.hotkey)
            .field("visible", &self.visible)
            .finish()
    }
}

impl TsundereState {
    /// Create an unloaded state holding built-in defaults
    pub fn new(store: Box<dyn ConfigStore + Send>) -> Self {
        let TsundereConfig {
            enabled,
            marker,
            hotkey,
        } = TsundereConfig::default();

        Self {
            enabled,
            marker,
            hotkey,
            visible: false,
            store,
        }
    }

    /// Load the configuration and register every hook with the host.
    ///
    /// Fails, registering nothing, when the schema descriptor cannot be
    /// resolved.
    pub fn create(
        host: &mut dyn Host,
        store: Box<dyn ConfigStore + Send>,
    ) -> Result<Self, ConfigError> {
        let mut state = Self::new(store);
        state.load()?;

        host.register_hotkey_filter(HotkeyHook {
            bindings: Self::hotkey,
            handle: Self::on_hotkey_toggle_requested,
        });
        host.register_commit_filter(CommitFilterHook {
            filter: Self::on_commit,
        });

        let title = host.translate(TEXT_DOMAIN, "Tsundere Engine");
        host.register_status(StatusHook {
            name: STATUS_NAME.to_string(),
            short_description: title.clone(),
            long_description: title,
            toggle: Self::toggle_enabled,
            get: Self::enabled,
        });
        host.watch_context(ContextWatcher {
            key: CONTEXT_IM_LANGUAGE.to_string(),
            notify: Self::on_language_changed,
        });

        info!(enabled = state.enabled, marker = %state.marker, "tsundere module created");
        Ok(state)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    pub fn hotkey(&self) -> &HotkeyPair {
        &self.hotkey
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Snapshot of the persisted options
    pub fn config(&self) -> TsundereConfig {
        TsundereConfig {
            enabled: self.enabled,
            marker: self.marker.clone(),
            hotkey: self.hotkey.clone(),
        }
    }

    /// Flip the enable flag and persist
    pub fn toggle_enabled(&mut self) {
        self.enabled = !self.enabled;
        info!(enabled = self.enabled, "tsundere toggled");
        self.save();
    }

    /// Recompute visibility for a new input method language and push it to
    /// the status indicator
    pub fn on_language_changed(&mut self, host: &mut dyn Host, language: Option<&str>) {
        self.visible = is_chinese_variant(language);
        debug!(?language, visible = self.visible, "input method language changed");
        host.set_status_visible(STATUS_NAME, self.visible);
    }

    /// Commit filter. `None` tells the host to commit the original text.
    pub fn on_commit(&self, host: &dyn Host, text: &str) -> Option<String> {
        if !host.has_active_input_method() || !self.enabled {
            return None;
        }
        Some(transform(text, self.marker.effective()))
    }

    /// Hotkey handler. Consumes the key and asks for a status refresh only
    /// while the status indicator is shown.
    pub fn on_hotkey_toggle_requested(&self, host: &mut dyn Host) -> HotkeyOutcome {
        if host.is_status_visible(STATUS_NAME) {
            host.update_status(STATUS_NAME);
            HotkeyOutcome::Consumed
        } else {
            HotkeyOutcome::PassThrough
        }
    }

    /// Read the persisted configuration.
    ///
    /// A missing configuration file is first-run: the current values are
    /// saved before binding. Unreadable or malformed files bind the schema
    /// defaults. Only schema errors are returned, and in that case the
    /// in-memory values are left untouched.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        let desc = self.store.desc()?;

        let text = match self.store.read() {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                info!("no configuration file, writing defaults");
                self.save();
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to read configuration, using defaults");
                None
            }
        };

        let table = text.and_then(|text| {
            match toml::from_str::<toml::Table>(&text).map_err(ConfigError::from) {
                Ok(table) => Some(table),
                Err(e) => {
                    warn!(error = %e, "failed to parse configuration, using defaults");
                    None
                }
            }
        });

        let config = desc.bind(table.as_ref())?;
        self.enabled = config.enabled;
        self.marker = config.marker;
        self.hotkey = config.hotkey;

        debug!(enabled = self.enabled, marker = %self.marker, hotkey = %self.hotkey, "configuration loaded");
        Ok(())
    }

    /// Persist the current options. Failures are logged only.
    pub fn save(&self) {
        if let Err(e) = self.store.write(&self.config()) {
            warn!(error = %e, "failed to save configuration");
        }
    }

    /// Reload the configuration on host request. Returns `false` when the
    /// previous values were kept.
    pub fn reload(&mut self) -> bool {
        match self.load() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "reload failed, keeping previous configuration");
                false
            }
        }
    }
}
