//! External command handling via stdin.
//!
//! While `clipfind watch` runs, JSONL commands on stdin drive the control
//! loop. This is mainly used for scripting and automation.
//!
//! # Protocol
//!
//! ```json
//! {"type": "search", "query": "budget"}
//! {"type": "searchClipboard"}
//! {"type": "setAutoSearch", "enabled": false}
//! {"type": "quit"}
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! echo '{"type": "search", "query": "invoice"}' | clipfind watch
//! ```

use async_channel::Sender;
use serde::Deserialize;

use crate::app::AppEvent;
use crate::logging;

/// Commands accepted on stdin.
///
/// `requestId` is optional and only used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExternalCommand {
    /// Search for the given text
    Search {
        query: String,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Search with the current clipboard text, as the hotkey does
    SearchClipboard,
    /// Turn clipboard-triggered searching on or off
    SetAutoSearch { enabled: bool },
    /// Stop the control loop
    Quit,
}

impl From<ExternalCommand> for AppEvent {
    fn from(cmd: ExternalCommand) -> Self {
        match cmd {
            ExternalCommand::Search { query, .. } => AppEvent::ManualSearch(query),
            ExternalCommand::SearchClipboard => AppEvent::HotkeyPressed,
            ExternalCommand::SetAutoSearch { enabled } => AppEvent::SetAutoSearch(enabled),
            ExternalCommand::Quit => AppEvent::Shutdown,
        }
    }
}

/// Parse one stdin line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Result<ExternalCommand, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Start a thread that forwards stdin commands to the control loop.
///
/// The thread exits at end of input or when the channel is closed. End of
/// input does not stop the app.
pub fn start_stdin_listener(tx: Sender<AppEvent>) {
    use std::io::BufRead;

    let spawned = std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            logging::log("STDIN", "External command listener started");
            let stdin = std::io::stdin();
            let reader = stdin.lock();

            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        logging::log("STDIN", &format!("Error reading stdin: {}", e));
                        break;
                    }
                };
                match parse_command(&line) {
                    Some(Ok(cmd)) => {
                        if let ExternalCommand::Search {
                            request_id: Some(id),
                            ..
                        } = &cmd
                        {
                            logging::log("STDIN", &format!("[{}] Received: {:?}", id, cmd));
                        } else {
                            logging::log("STDIN", &format!("Received: {:?}", cmd));
                        }
                        // send_blocking is used since we're in a sync thread
                        if tx.send_blocking(cmd.into()).is_err() {
                            logging::log("STDIN", "Command channel closed, exiting");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        logging::log("STDIN", &format!("Failed to parse command: {}", e));
                    }
                    None => {}
                }
            }
            logging::log("STDIN", "External command listener exiting");
        });

    if let Err(e) = spawned {
        logging::log("STDIN", &format!("Failed to start stdin listener: {}", e));
    }
}
