//! Where search results and notifications go.
//!
//! The orchestrator only talks to the `Presenter` trait. `ConsolePresenter`
//! is the terminal implementation used by the binary.

use std::io::{self, Write};

use serde::Serialize;
use tracing::warn;

use crate::file_search::SearchResult;
use crate::logging;

pub trait Presenter {
    fn show_results(&mut self, results: &[SearchResult], query: &str);
    fn show_notification(&mut self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per search, one line each
    Json,
}

#[derive(Serialize)]
struct ResultsRecord<'a> {
    query: &'a str,
    count: usize,
    results: &'a [SearchResult],
}

/// Writes results to `out` and notifications to stderr and the log.
pub struct ConsolePresenter<W: Write = io::Stdout> {
    out: W,
    format: OutputFormat,
    last_results: Vec<SearchResult>,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            last_results: Vec::new(),
        }
    }

    /// Results of the most recent `show_results` call.
    pub fn last_results(&self) -> &[SearchResult] {
        &self.last_results
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_results(&mut self, results: &[SearchResult], query: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let record = ResultsRecord {
                    query,
                    count: results.len(),
                    results,
                };
                let line = serde_json::to_string(&record).map_err(io::Error::other)?;
                writeln!(self.out, "{}", line)?;
            }
            OutputFormat::Text => {
                writeln!(
                    self.out,
                    "Search Results for '{}' ({} found)",
                    query,
                    results.len()
                )?;
                for result in results {
                    writeln!(self.out, "  {}\t{}", result.file_name, result.path.display())?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn show_results(&mut self, results: &[SearchResult], query: &str) {
        self.last_results = results.to_vec();
        if let Err(e) = self.write_results(results, query) {
            warn!(error = %e, "Failed to write search results");
        }
    }

    fn show_notification(&mut self, title: &str, message: &str) {
        logging::log("APP", &format!("Notification: {} - {}", title, message));
        eprintln!("{}: {}", title, message);
    }
}

/// Open the folder containing `result` in the platform file manager.
pub fn reveal(result: &SearchResult) -> io::Result<()> {
    let target = result.path.parent().unwrap_or(result.path.as_path());
    logging::log("APP", &format!("Revealing {}", target.display()));
    open::that(target)
}
