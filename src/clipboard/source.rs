//! Clipboard read access.

use arboard::Clipboard;
use tracing::debug;

/// Reads the system clipboard's text content.
///
/// `Send` is required because the watcher samples from its own thread.
pub trait ClipboardSource: Send {
    /// Current clipboard text, or `None` when there is no text or the read failed.
    fn read_text(&mut self) -> Option<String>;
}

/// System clipboard through `arboard`.
///
/// A clipboard handle is opened per read so the source carries no
/// platform handle across threads.
#[derive(Debug, Default)]
pub struct ArboardSource;

impl ArboardSource {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSource for ArboardSource {
    fn read_text(&mut self) -> Option<String> {
        let mut clipboard = match Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                debug!(error = %e, "Failed to open clipboard");
                return None;
            }
        };

        match clipboard.get_text() {
            Ok(text) => Some(text),
            Err(arboard::Error::ContentNotAvailable) => None,
            Err(e) => {
                debug!(error = %e, "Failed to read clipboard text");
                None
            }
        }
    }
}

#[cfg(all(test, feature = "system-tests"))]
mod tests {
    use super::*;

    #[test]
    fn reads_text_written_by_arboard() {
        let mut clipboard = Clipboard::new().expect("clipboard");
        clipboard.set_text("clipfind system test").expect("set text");

        let mut source = ArboardSource::new();
        assert_eq!(source.read_text().as_deref(), Some("clipfind system test"));
    }
}
