//! Filename search over a directory tree
//!
//! - `pattern` - query text + options to a `find` name pattern
//! - `runner` - process invocation behind the `ProcessRunner` trait
//! - `engine` - `FileSearchEngine`, request/result types and output parsing

mod engine;
mod pattern;
mod runner;

pub use engine::{parse_output, FileSearchEngine, SearchError, SearchRequest, SearchResult};
pub use pattern::{build_pattern, NamePattern, SearchOptions};
pub use runner::{resolve_program, CommandRunner, ProcessOutput, ProcessRunner};
