//! Trigger-to-results coordination.
//!
//! Every trigger (clipboard change, hotkey press, manual request) goes through
//! `SearchOrchestrator`. A search is split into three steps so that a newer
//! trigger can supersede an older one:
//!
//! 1. `begin` applies the guards and hands out a `SearchTicket`
//! 2. `run` resolves the directory, opens scoped access and runs the engine
//! 3. `finish` publishes the outcome, unless a newer ticket was issued
//!
//! All three run on the control thread; nothing here is shared across threads.

use std::time::Instant;

use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::directory_access::{AccessError, SecureDirectoryAccessor};
use crate::error::ClipfindError;
use crate::file_search::{FileSearchEngine, SearchRequest, SearchResult};
use crate::logging;
use crate::preferences::PreferencesStore;
use crate::presenter::Presenter;

pub const NO_TEXT_TITLE: &str = "No text in clipboard";
pub const NO_TEXT_MESSAGE: &str = "Please copy text to the clipboard before searching";
pub const NO_RESULTS_TITLE: &str = "No results found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Clipboard,
    Hotkey,
    Manual,
}

/// Something that may start a search, with the text it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub source: TriggerSource,
    pub text: Option<String>,
}

impl Trigger {
    pub fn clipboard(text: impl Into<String>) -> Self {
        Self {
            source: TriggerSource::Clipboard,
            text: Some(text.into()),
        }
    }

    pub fn hotkey(text: Option<String>) -> Self {
        Self {
            source: TriggerSource::Hotkey,
            text,
        }
    }

    pub fn manual(text: impl Into<String>) -> Self {
        Self {
            source: TriggerSource::Manual,
            text: Some(text.into()),
        }
    }

    /// The trimmed text, or `None` when there is nothing to search for.
    pub fn query(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching { generation: u64, query: String },
}

/// Proof that `begin` accepted a trigger. Only the newest ticket publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
    pub source: TriggerSource,
    pub search_id: String,
}

/// What happened to one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Empty or whitespace-only text; nothing was started
    Ignored,
    /// A notification was shown instead of results
    Notified { title: String },
    /// Results (possibly none) were handed to the presenter
    Published { count: usize },
    /// A newer trigger arrived first; results were dropped
    Superseded,
}

pub struct SearchOrchestrator<S: PreferencesStore, P: Presenter> {
    preferences: S,
    presenter: P,
    accessor: SecureDirectoryAccessor,
    engine: FileSearchEngine,
    state: SearchState,
    generation: u64,
}

impl<S: PreferencesStore, P: Presenter> SearchOrchestrator<S, P> {
    pub fn new(
        preferences: S,
        presenter: P,
        accessor: SecureDirectoryAccessor,
        engine: FileSearchEngine,
    ) -> Self {
        Self {
            preferences,
            presenter,
            accessor,
            engine,
            state: SearchState::Idle,
            generation: 0,
        }
    }

    /// Run a trigger start to finish.
    pub fn handle_trigger(&mut self, trigger: Trigger) -> SearchOutcome {
        match self.accept(trigger) {
            Ok(ticket) => {
                let result = self.run(&ticket);
                self.finish(&ticket, result)
            }
            Err(outcome) => outcome,
        }
    }

    /// Accept a trigger and move to `Searching`.
    ///
    /// Returns `None` when the text is empty or whitespace. Clipboard triggers
    /// are dropped silently; hotkey and manual triggers notify the user.
    pub fn begin(&mut self, trigger: Trigger) -> Option<SearchTicket> {
        self.accept(trigger).ok()
    }

    fn accept(&mut self, trigger: Trigger) -> Result<SearchTicket, SearchOutcome> {
        let Some(query) = trigger.query().map(str::to_string) else {
            return Err(match trigger.source {
                TriggerSource::Clipboard => {
                    debug!("Ignoring empty clipboard trigger");
                    SearchOutcome::Ignored
                }
                TriggerSource::Hotkey | TriggerSource::Manual => {
                    self.presenter.show_notification(NO_TEXT_TITLE, NO_TEXT_MESSAGE);
                    SearchOutcome::Notified {
                        title: NO_TEXT_TITLE.to_string(),
                    }
                }
            });
        };

        self.generation += 1;
        if let SearchState::Searching { query: previous, .. } = &self.state {
            info!(previous = %previous, next = %query, "Superseding in-flight search");
        }
        self.state = SearchState::Searching {
            generation: self.generation,
            query: query.clone(),
        };

        Ok(SearchTicket {
            generation: self.generation,
            query,
            source: trigger.source,
            search_id: Uuid::new_v4().to_string(),
        })
    }

    /// Resolve, validate, open access and search. Access is released before
    /// this returns, whatever the outcome.
    pub fn run(&mut self, ticket: &SearchTicket) -> Result<Vec<SearchResult>, ClipfindError> {
        let span = info_span!(
            "search",
            search_id = %ticket.search_id,
            source = ?ticket.source,
            query = %ticket.query
        );
        let _enter = span.enter();
        let started = Instant::now();

        let bookmark = self
            .preferences
            .search_directory_bookmark()
            .ok_or(AccessError::EmptyBookmark)?;
        let handle = self.accessor.resolve(&bookmark, &mut self.preferences)?;
        if !self.accessor.validate(&handle) {
            return Err(AccessError::Invalid(handle.path().to_path_buf()).into());
        }

        let options = self.preferences.search_options();
        let results = {
            let access = self.accessor.open(&handle)?;
            let request = SearchRequest {
                query_text: ticket.query.clone(),
                directory: access.handle().clone(),
                options,
            };
            self.engine.search(&request)?
        };

        logging::log_search_event(
            &ticket.search_id,
            &ticket.query,
            results.len(),
            started.elapsed().as_millis() as u64,
        );
        Ok(results)
    }

    /// Publish the outcome of `ticket` and return to `Idle`.
    pub fn finish(
        &mut self,
        ticket: &SearchTicket,
        result: Result<Vec<SearchResult>, ClipfindError>,
    ) -> SearchOutcome {
        if ticket.generation != self.generation {
            debug!(
                search_id = %ticket.search_id,
                generation = ticket.generation,
                current = self.generation,
                "Discarding superseded search result"
            );
            return SearchOutcome::Superseded;
        }
        self.state = SearchState::Idle;

        match result {
            Ok(results) => {
                if results.is_empty() {
                    self.presenter.show_notification(
                        NO_RESULTS_TITLE,
                        &format!("No files found matching '{}'", ticket.query),
                    );
                }
                self.presenter.show_results(&results, &ticket.query);
                SearchOutcome::Published {
                    count: results.len(),
                }
            }
            Err(e) => {
                e.report("SEARCH", Some(&ticket.query));
                let (title, message) = e.notification();
                self.presenter.show_notification(&title, &message);
                SearchOutcome::Notified { title }
            }
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn preferences(&self) -> &S {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut S {
        &mut self.preferences
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
