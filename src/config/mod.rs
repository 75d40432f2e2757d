//! Configuration module - Application settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.clipfind/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - The `Config` struct and its accessors
//! - `loader` - File system loading and parsing
//!
//! User preferences edited at runtime (search directory, matching options,
//! hotkey) live in `crate::preferences`, not here.

pub mod defaults;
mod loader;
mod types;

pub use loader::{config_path, load_config, load_config_from};
pub use types::Config;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
