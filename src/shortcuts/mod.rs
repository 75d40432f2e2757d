//! Hotkey binding representation.
//!
//! # Example
//!
//! ```ignore
//! use clipfind::shortcuts::HotkeyBinding;
//!
//! let binding = HotkeyBinding::parse("cmd+shift+f")?;
//! println!("Display: {}", binding.display()); // ⌘⇧F
//! ```

mod types;

pub use types::{modifier, HotkeyBinding, ShortcutParseError, KEY_CODE_F};
