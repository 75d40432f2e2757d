//! Hotkey binding type with parsing and symbolic display.
//!
//! A binding is stored the way the preferences file has always stored it:
//! a macOS virtual key code plus a Carbon-style modifier mask. Parsing and
//! display go through a single key table so the two never disagree.

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("shortcut has no key, only modifiers")]
    MissingKey,
    #[error("unknown token '{0}' in shortcut")]
    UnknownToken(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Modifier bits carried in `HotkeyBinding::modifier_mask`.
pub mod modifier {
    pub const CMD: u32 = 256;
    pub const SHIFT: u32 = 512;
    pub const OPTION: u32 = 2048;
    pub const CONTROL: u32 = 4096;
}

/// Virtual key code for `F`.
pub const KEY_CODE_F: u32 = 3;

struct KeyEntry {
    code: u32,
    display: &'static str,
    os_code: Code,
    names: &'static [&'static str],
}

const fn key(
    code: u32,
    display: &'static str,
    os_code: Code,
    names: &'static [&'static str],
) -> KeyEntry {
    KeyEntry {
        code,
        display,
        os_code,
        names,
    }
}

static KEYS: &[KeyEntry] = &[
    key(0, "A", Code::KeyA, &["a"]),
    key(1, "S", Code::KeyS, &["s"]),
    key(2, "D", Code::KeyD, &["d"]),
    key(3, "F", Code::KeyF, &["f"]),
    key(4, "H", Code::KeyH, &["h"]),
    key(5, "G", Code::KeyG, &["g"]),
    key(6, "Z", Code::KeyZ, &["z"]),
    key(7, "X", Code::KeyX, &["x"]),
    key(8, "C", Code::KeyC, &["c"]),
    key(9, "V", Code::KeyV, &["v"]),
    key(11, "B", Code::KeyB, &["b"]),
    key(12, "Q", Code::KeyQ, &["q"]),
    key(13, "W", Code::KeyW, &["w"]),
    key(14, "E", Code::KeyE, &["e"]),
    key(15, "R", Code::KeyR, &["r"]),
    key(16, "Y", Code::KeyY, &["y"]),
    key(17, "T", Code::KeyT, &["t"]),
    key(18, "1", Code::Digit1, &["1"]),
    key(19, "2", Code::Digit2, &["2"]),
    key(20, "3", Code::Digit3, &["3"]),
    key(21, "4", Code::Digit4, &["4"]),
    key(22, "6", Code::Digit6, &["6"]),
    key(23, "5", Code::Digit5, &["5"]),
    key(25, "9", Code::Digit9, &["9"]),
    key(26, "7", Code::Digit7, &["7"]),
    key(28, "8", Code::Digit8, &["8"]),
    key(29, "0", Code::Digit0, &["0"]),
    key(31, "O", Code::KeyO, &["o"]),
    key(32, "U", Code::KeyU, &["u"]),
    key(34, "I", Code::KeyI, &["i"]),
    key(35, "P", Code::KeyP, &["p"]),
    key(36, "↵", Code::Enter, &["enter", "return"]),
    key(37, "L", Code::KeyL, &["l"]),
    key(38, "J", Code::KeyJ, &["j"]),
    key(39, "'", Code::Quote, &["quote", "'", "apostrophe"]),
    key(40, "K", Code::KeyK, &["k"]),
    key(41, ";", Code::Semicolon, &["semicolon", ";"]),
    key(42, "\\", Code::Backslash, &["backslash", "\\"]),
    key(43, ",", Code::Comma, &["comma", ","]),
    key(44, "/", Code::Slash, &["slash", "/"]),
    key(45, "N", Code::KeyN, &["n"]),
    key(46, "M", Code::KeyM, &["m"]),
    key(47, ".", Code::Period, &["period", ".", "dot"]),
    key(48, "⇥", Code::Tab, &["tab"]),
    key(49, "Space", Code::Space, &["space"]),
    key(96, "F5", Code::F5, &["f5"]),
    key(97, "F6", Code::F6, &["f6"]),
    key(98, "F7", Code::F7, &["f7"]),
    key(99, "F3", Code::F3, &["f3"]),
    key(100, "F8", Code::F8, &["f8"]),
    key(101, "F9", Code::F9, &["f9"]),
    key(103, "F11", Code::F11, &["f11"]),
    key(109, "F10", Code::F10, &["f10"]),
    key(111, "F12", Code::F12, &["f12"]),
    key(118, "F4", Code::F4, &["f4"]),
    key(120, "F2", Code::F2, &["f2"]),
    key(122, "F1", Code::F1, &["f1"]),
    key(123, "←", Code::ArrowLeft, &["left", "arrowleft"]),
    key(124, "→", Code::ArrowRight, &["right", "arrowright"]),
    key(125, "↓", Code::ArrowDown, &["down", "arrowdown"]),
    key(126, "↑", Code::ArrowUp, &["up", "arrowup"]),
];

fn entry_for_code(code: u32) -> Option<&'static KeyEntry> {
    KEYS.iter().find(|entry| entry.code == code)
}

fn entry_for_name(name: &str) -> Option<&'static KeyEntry> {
    let lower = name.to_lowercase();
    KEYS.iter().find(|entry| entry.names.contains(&lower.as_str()))
}

/// A global key combination: virtual key code plus modifier mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyBinding {
    pub key_code: u32,
    #[serde(rename = "modifiers")]
    pub modifier_mask: u32,
}

impl Default for HotkeyBinding {
    /// Cmd+Shift+F
    fn default() -> Self {
        Self {
            key_code: KEY_CODE_F,
            modifier_mask: modifier::CMD | modifier::SHIFT,
        }
    }
}

impl HotkeyBinding {
    pub fn new(key_code: u32, modifier_mask: u32) -> Self {
        Self {
            key_code,
            modifier_mask,
        }
    }

    /// Parse a shortcut like `cmd+shift+f` or `ctrl alt space`.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        let normalized = s.replace('+', " ");
        let mut modifier_mask = 0;
        let mut key_part: Option<&str> = None;

        for part in normalized.split_whitespace() {
            match part.to_lowercase().as_str() {
                "cmd" | "command" | "meta" | "super" | "⌘" => modifier_mask |= modifier::CMD,
                "ctrl" | "control" | "⌃" => modifier_mask |= modifier::CONTROL,
                "alt" | "opt" | "option" | "⌥" => modifier_mask |= modifier::OPTION,
                "shift" | "⇧" => modifier_mask |= modifier::SHIFT,
                _ => {
                    if key_part.is_some() {
                        return Err(ShortcutParseError::UnknownToken(part.to_string()));
                    }
                    key_part = Some(part);
                }
            }
        }

        let key = key_part.ok_or(ShortcutParseError::MissingKey)?;
        let entry = entry_for_name(key).ok_or_else(|| ShortcutParseError::UnknownKey(key.to_string()))?;

        Ok(Self {
            key_code: entry.code,
            modifier_mask,
        })
    }

    pub fn has(&self, bit: u32) -> bool {
        self.modifier_mask & bit != 0
    }

    /// Symbolic form, e.g. `⌘⇧F`. Unknown key codes render as `#<code>`.
    pub fn display(&self) -> String {
        let mut s = String::new();
        if self.has(modifier::CMD) {
            s.push('⌘');
        }
        if self.has(modifier::OPTION) {
            s.push('⌥');
        }
        if self.has(modifier::CONTROL) {
            s.push('⌃');
        }
        if self.has(modifier::SHIFT) {
            s.push('⇧');
        }
        match entry_for_code(self.key_code) {
            Some(entry) => s.push_str(entry.display),
            None => s.push_str(&format!("#{}", self.key_code)),
        }
        s
    }

    /// Convert to the OS-layer hotkey. `None` if the key code has no mapping.
    pub fn to_hotkey(&self) -> Option<HotKey> {
        let entry = entry_for_code(self.key_code)?;

        let mut mods = Modifiers::empty();
        if self.has(modifier::CMD) {
            mods |= Modifiers::META;
        }
        if self.has(modifier::CONTROL) {
            mods |= Modifiers::CONTROL;
        }
        if self.has(modifier::OPTION) {
            mods |= Modifiers::ALT;
        }
        if self.has(modifier::SHIFT) {
            mods |= Modifiers::SHIFT;
        }

        let mods = if mods.is_empty() { None } else { Some(mods) };
        Some(HotKey::new(mods, entry.os_code))
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
