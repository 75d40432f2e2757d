use thiserror::Error;
use tracing::{error, info, warn};

use crate::directory_access::AccessError;
use crate::file_search::SearchError;
use crate::hotkeys::HotkeyError;
use crate::logging;
use crate::preferences::PreferencesError;
use crate::shortcuts::ShortcutParseError;

/// How loud a failure should be when surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // expected user state, e.g. nothing configured yet
    Warning,  // recoverable, the app keeps working
    Error,    // the requested operation failed
    Critical, // requires user action before anything works again
}

/// Any component failure that reaches the orchestrator or the CLI.
#[derive(Error, Debug)]
pub enum ClipfindError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Hotkey(#[from] HotkeyError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Preferences(#[from] PreferencesError),

    #[error(transparent)]
    Shortcut(#[from] ShortcutParseError),
}

impl ClipfindError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Access(AccessError::EmptyBookmark) => ErrorSeverity::Info,
            Self::Access(AccessError::Denied(_)) => ErrorSeverity::Critical,
            Self::Access(_) => ErrorSeverity::Error,
            Self::Hotkey(_) => ErrorSeverity::Warning,
            Self::Search(SearchError::EmptyQuery) => ErrorSeverity::Info,
            Self::Search(SearchError::ExecutionFailed { .. }) => ErrorSeverity::Error,
            Self::Preferences(_) => ErrorSeverity::Warning,
            Self::Shortcut(_) => ErrorSeverity::Warning,
        }
    }

    /// Log at the level matching `severity()`: info, warn, or error for both
    /// `Error` and `Critical`.
    pub fn report(&self, category: &str, context: Option<&str>) {
        let message = self.to_string();
        match self.severity() {
            ErrorSeverity::Info => info!(
                event_type = "error",
                category = category,
                context = context,
                "{}",
                message
            ),
            ErrorSeverity::Warning => warn!(
                event_type = "error",
                category = category,
                context = context,
                "{}",
                message
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                logging::log_error(category, &message, context)
            }
        }
    }

    /// Title and body of the single notification shown for this failure.
    pub fn notification(&self) -> (String, String) {
        let (title, message) = match self {
            Self::Access(AccessError::EmptyBookmark) => (
                "No search directory",
                "Please set a search directory in preferences".to_string(),
            ),
            Self::Access(AccessError::Unresolvable { path, .. })
            | Self::Access(AccessError::Invalid(path)) => (
                "Search directory unavailable",
                format!(
                    "'{}' could not be opened. Please choose the search directory again",
                    path.display()
                ),
            ),
            Self::Access(AccessError::Denied(path)) => (
                "Access denied",
                format!("Permission to read '{}' was denied", path.display()),
            ),
            Self::Hotkey(HotkeyError::RegistrationFailed(msg)) => {
                ("Hotkey unavailable", msg.clone())
            }
            Self::Search(SearchError::EmptyQuery) => (
                "No text in clipboard",
                "Please copy text to the clipboard before searching".to_string(),
            ),
            Self::Search(SearchError::ExecutionFailed { program, source }) => (
                "Search failed",
                format!(
                    "Could not start file search '{}': {}",
                    program.display(),
                    source
                ),
            ),
            Self::Preferences(e) => ("Preferences error", e.to_string()),
            Self::Shortcut(e) => ("Invalid shortcut", e.to_string()),
        };
        (title.to_string(), message)
    }
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use clipfind::error::ResultExt;
///
/// // A failed preferences write is logged, the in-memory value still applies
/// prefs.save().warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn missing_directory_maps_to_setup_notification() {
        let err = ClipfindError::from(AccessError::EmptyBookmark);
        assert_eq!(err.severity(), ErrorSeverity::Info);
        let (title, message) = err.notification();
        assert_eq!(title, "No search directory");
        assert_eq!(message, "Please set a search directory in preferences");
    }

    #[test]
    fn denied_access_names_the_path() {
        let err = ClipfindError::from(AccessError::Denied(PathBuf::from("/Volumes/Share")));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        let (title, message) = err.notification();
        assert_eq!(title, "Access denied");
        assert!(message.contains("/Volumes/Share"));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let err = ClipfindError::from(SearchError::ExecutionFailed {
            program: PathBuf::from("/usr/bin/find"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);
        let (title, message) = err.notification();
        assert_eq!(title, "Search failed");
        assert!(message.contains("/usr/bin/find"));
    }

    #[test]
    fn hotkey_failure_keeps_backend_message() {
        let err = ClipfindError::from(HotkeyError::RegistrationFailed(
            "Hotkey '⌘⇧F' is already registered".into(),
        ));
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(
            err.notification(),
            (
                "Hotkey unavailable".to_string(),
                "Hotkey '⌘⇧F' is already registered".to_string()
            )
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn reported(err: &ClipfindError) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, || err.report("SEARCH", Some("budget")));
        let bytes = out.0.lock().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn report_level_follows_severity() {
        let unset = reported(&ClipfindError::from(AccessError::EmptyBookmark));
        assert!(unset.contains("INFO"), "{}", unset);

        let hotkey = reported(&ClipfindError::from(HotkeyError::RegistrationFailed(
            "taken".into(),
        )));
        assert!(hotkey.contains("WARN"), "{}", hotkey);

        let denied = reported(&ClipfindError::from(AccessError::Denied(PathBuf::from(
            "/Volumes/Share",
        ))));
        assert!(denied.contains("ERROR"), "{}", denied);
        assert!(denied.contains("/Volumes/Share"));
    }

    #[test]
    fn result_ext_returns_value_or_none() {
        let ok: std::result::Result<u32, &str> = Ok(7);
        assert_eq!(ok.log_err(), Some(7));

        let err: std::result::Result<u32, &str> = Err("boom");
        assert_eq!(err.warn_on_err(), None);
    }
}
