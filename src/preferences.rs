//! User preference persistence.
//!
//! Stored in ~/.clipfind/preferences.json (camelCase JSON):
//!
//! ```json
//! {
//!   "searchDirectory": { "path": "/Users/a/Documents", "resolved": "/Users/a/Documents" },
//!   "caseSensitive": false,
//!   "fuzzyMatching": true,
//!   "searchHotkey": { "keyCode": 3, "modifiers": 768 },
//!   "allowedExtensions": ["md", "txt", "pdf", "doc", "docx", "pages"]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::directory_access::PersistedBookmark;
use crate::error::ResultExt;
use crate::file_search::SearchOptions;
use crate::shortcuts::HotkeyBinding;

/// Typed access to persisted preferences.
pub trait PreferencesStore {
    fn search_directory_bookmark(&self) -> Option<PersistedBookmark>;
    fn save_search_directory_bookmark(&mut self, bookmark: PersistedBookmark);
    fn search_options(&self) -> SearchOptions;
    fn hotkey_binding(&self) -> Option<HotkeyBinding>;

    fn set_case_sensitive(&mut self, value: bool);
    fn set_fuzzy_matching(&mut self, value: bool);
    fn set_hotkey_binding(&mut self, binding: HotkeyBinding);
}

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_fuzzy_matching() -> bool {
    SearchOptions::default().fuzzy_matching
}

fn default_allowed_extensions() -> Vec<String> {
    ["md", "txt", "pdf", "doc", "docx", "pages"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// On-disk preferences document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_directory: Option<PersistedBookmark>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_fuzzy_matching")]
    pub fuzzy_matching: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_hotkey: Option<HotkeyBinding>,
    /// Persisted for the settings surface; does not filter search results.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for PreferencesFile {
    fn default() -> Self {
        Self {
            search_directory: None,
            case_sensitive: false,
            fuzzy_matching: default_fuzzy_matching(),
            search_hotkey: None,
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// JSON-file backed preferences. Every setter writes through to disk.
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    data: PreferencesFile,
}

impl JsonPreferences {
    /// Load preferences from `path`.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "Preferences file not found, using defaults");
            return Ok(Self {
                path,
                data: PreferencesFile::default(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let data: PreferencesFile = serde_json::from_str(&content)?;
        Ok(Self { path, data })
    }

    /// Save preferences to disk, creating parent directories if needed.
    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &PreferencesFile {
        &self.data
    }

    fn persist(&self) {
        self.save().warn_on_err();
    }
}

impl PreferencesStore for JsonPreferences {
    fn search_directory_bookmark(&self) -> Option<PersistedBookmark> {
        self.data.search_directory.clone()
    }

    fn save_search_directory_bookmark(&mut self, bookmark: PersistedBookmark) {
        self.data.search_directory = Some(bookmark);
        self.persist();
    }

    fn search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.data.case_sensitive,
            fuzzy_matching: self.data.fuzzy_matching,
        }
    }

    fn hotkey_binding(&self) -> Option<HotkeyBinding> {
        self.data.search_hotkey
    }

    fn set_case_sensitive(&mut self, value: bool) {
        self.data.case_sensitive = value;
        self.persist();
    }

    fn set_fuzzy_matching(&mut self, value: bool) {
        self.data.fuzzy_matching = value;
        self.persist();
    }

    fn set_hotkey_binding(&mut self, binding: HotkeyBinding) {
        self.data.search_hotkey = Some(binding);
        self.persist();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// In-memory store that counts bookmark writes.
    #[derive(Debug, Default)]
    pub struct MemoryPreferences {
        pub bookmark: Option<PersistedBookmark>,
        pub options: SearchOptions,
        pub hotkey: Option<HotkeyBinding>,
        pub saves: usize,
    }

    impl PreferencesStore for MemoryPreferences {
        fn search_directory_bookmark(&self) -> Option<PersistedBookmark> {
            self.bookmark.clone()
        }

        fn save_search_directory_bookmark(&mut self, bookmark: PersistedBookmark) {
            self.bookmark = Some(bookmark);
            self.saves += 1;
        }

        fn search_options(&self) -> SearchOptions {
            self.options
        }

        fn hotkey_binding(&self) -> Option<HotkeyBinding> {
            self.hotkey
        }

        fn set_case_sensitive(&mut self, value: bool) {
            self.options.case_sensitive = value;
        }

        fn set_fuzzy_matching(&mut self, value: bool) {
            self.options.fuzzy_matching = value;
        }

        fn set_hotkey_binding(&mut self, binding: HotkeyBinding) {
            self.hotkey = Some(binding);
        }
    }
}
