//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use super::defaults::*;
use crate::shortcuts::HotkeyBinding;

/// Startup configuration read from ~/.clipfind/config.json.
///
/// Every field is optional; use the `get_*` accessors, which fall back to the
/// defaults in `config::defaults`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Clipboard poll interval in milliseconds (default: 500)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    /// Program used for filename search (default: "find")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_program: Option<String>,
    /// Search on every clipboard change (default: true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_search: Option<bool>,
    /// Where preferences are stored (default: ~/.clipfind/preferences.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<String>,
    /// Shortcut used until one is saved in preferences, e.g. "cmd+shift+f"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
}

impl Config {
    /// Returns the poll interval, clamped to MIN_POLL_INTERVAL_MS
    pub fn get_poll_interval(&self) -> Duration {
        let ms = self
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(MIN_POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    pub fn get_search_program(&self) -> String {
        self.search_program
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SEARCH_PROGRAM.to_string())
    }

    pub fn get_auto_search(&self) -> bool {
        self.auto_search.unwrap_or(DEFAULT_AUTO_SEARCH)
    }

    /// Returns the preferences path with `~` expanded
    pub fn get_preferences_path(&self) -> PathBuf {
        let raw = self
            .preferences_path
            .as_deref()
            .unwrap_or(DEFAULT_PREFERENCES_PATH);
        PathBuf::from(shellexpand::tilde(raw).as_ref())
    }

    /// Returns the configured fallback hotkey; an unparseable value logs and
    /// yields the built-in default.
    pub fn get_hotkey(&self) -> HotkeyBinding {
        let raw = self.hotkey.as_deref().unwrap_or(DEFAULT_HOTKEY);
        match HotkeyBinding::parse(raw) {
            Ok(binding) => binding,
            Err(e) => {
                warn!(hotkey = raw, error = %e, "Invalid hotkey in config, using default");
                HotkeyBinding::default()
            }
        }
    }
}
