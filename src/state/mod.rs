//! Module state
//!
//! Owns the persisted options (enable flag, marker, toggle hotkey) and the
//! status visibility derived from the input method language:
//! - toggling flips the flag and persists it
//! - commits are transformed only while enabled with an input method active
//! - the toggle hotkey is consumed only while the status indicator is shown

mod tsundere;

pub use tsundere::{is_chinese_variant, TsundereState};
