//! Clipboard watching
//!
//! - `source` - `ClipboardSource` trait and the `arboard` implementation
//! - `watcher` - interval sampling with de-duplication against the last surfaced text
//!
//! Polling sits behind `ClipboardWatcher`'s start/stop/tick interface so a
//! native change-notification API can replace it without touching callers.

mod source;
mod watcher;

pub use source::{ArboardSource, ClipboardSource};
pub use watcher::{ChangeHandler, ClipboardSnapshot, ClipboardWatcher};
