//! clipfind - clipboard-triggered filename search
//!
//! Watches the clipboard (and a global hotkey) and searches a configured
//! directory tree for files whose names match the copied text.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod directory_access;
pub mod error;
pub mod event_loop;
pub mod file_search;
pub mod hotkeys;
pub mod logging;
pub mod orchestrator;
pub mod preferences;
pub mod presenter;
pub mod shortcuts;
pub mod stdin_commands;
