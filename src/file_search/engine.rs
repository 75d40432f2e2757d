use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use super::pattern::{build_pattern, SearchOptions};
use super::runner::{resolve_program, CommandRunner, ProcessRunner};
use crate::directory_access::DirectoryHandle;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to start '{program}': {source}")]
    ExecutionFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Search query is empty")]
    EmptyQuery,
}

/// One unit of search work.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query_text: String,
    pub directory: DirectoryHandle,
    pub options: SearchOptions,
}

/// A matched file. Equality is path equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub path: PathBuf,
    pub file_name: String,
}

impl SearchResult {
    /// `None` for relative paths and paths without a final component.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return None;
        }
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self { path, file_name })
    }
}

/// Parse newline-delimited absolute paths, skipping lines that aren't one.
///
/// Order is preserved exactly as the process produced it. Lines are taken as
/// raw bytes so file names that aren't UTF-8 keep their exact path.
pub fn parse_output(output: &[u8]) -> Vec<SearchResult> {
    output
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .filter_map(|line| {
            let result = line_to_path(line).and_then(SearchResult::from_path);
            if result.is_none() {
                debug!(
                    line = %String::from_utf8_lossy(line),
                    "Skipping unparseable search output line"
                );
            }
            result
        })
        .collect()
}

#[cfg(unix)]
fn line_to_path(line: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(line)))
}

#[cfg(not(unix))]
fn line_to_path(line: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(line).ok().map(PathBuf::from)
}

/// Filename search over an external traversal process (`find` by default).
pub struct FileSearchEngine {
    program: PathBuf,
    runner: Box<dyn ProcessRunner>,
}

impl Default for FileSearchEngine {
    fn default() -> Self {
        Self::new(crate::config::defaults::DEFAULT_SEARCH_PROGRAM)
    }
}

impl FileSearchEngine {
    pub fn new(program: &str) -> Self {
        Self::with_runner(resolve_program(program), Box::new(CommandRunner))
    }

    pub fn with_runner(program: impl Into<PathBuf>, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Arguments for one request: `[root, -name|-iname, pattern]`.
    pub fn arguments(request: &SearchRequest) -> Vec<OsString> {
        let pattern = build_pattern(&request.query_text, request.options);
        vec![
            request.directory.path().as_os_str().to_owned(),
            OsString::from(pattern.flag()),
            OsString::from(pattern.pattern),
        ]
    }

    /// Run the search and return matches in traversal order.
    ///
    /// Blocks until the process exits. No matches (including a non-zero exit
    /// with no usable output) is an empty list, not an error.
    #[instrument(skip_all, fields(query = %request.query_text))]
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        if request.query_text.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let args = Self::arguments(request);
        debug!(program = %self.program.display(), args = ?args, "Spawning search process");

        let output = self
            .runner
            .run(&self.program, &args)
            .map_err(|source| SearchError::ExecutionFailed {
                program: self.program.clone(),
                source,
            })?;

        let results = parse_output(&output.combined);
        if output.status != Some(0) {
            debug!(
                status = ?output.status,
                results = results.len(),
                "Search process exited unsuccessfully"
            );
        }
        Ok(results)
    }
}
