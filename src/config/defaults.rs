//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Clipboard sampling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Lower bound for a configured poll interval
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Filesystem traversal program used for searches
pub const DEFAULT_SEARCH_PROGRAM: &str = "find";

/// Search automatically when the clipboard changes
pub const DEFAULT_AUTO_SEARCH: bool = true;

/// Global shortcut used when preferences have none
pub const DEFAULT_HOTKEY: &str = "cmd+shift+f";

/// Preferences file, relative to the home directory
pub const DEFAULT_PREFERENCES_PATH: &str = "~/.clipfind/preferences.json";

/// Config file location
pub const CONFIG_PATH: &str = "~/.clipfind/config.json";
