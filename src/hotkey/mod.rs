//! Hotkey descriptors for the toggle binding
//!
//! Parses and renders the key combinations stored in the `Hotkey` option.

mod binding;
mod keys;

pub use binding::HotkeyPair;
pub use keys::{Hotkey, HotkeyError, ModifierState};
