//! # clipfind
//!
//! Searches a configured directory for files named like the text on the
//! clipboard, on every clipboard change or on a global hotkey.
//!
//! ## Usage
//!
//! - `clipfind` / `clipfind watch` - watch the clipboard and the hotkey
//! - `clipfind search <QUERY>` - run one search and print the results
//! - `clipfind set-dir <PATH>` - choose the directory to search
//! - `clipfind options --fuzzy false` - change matching options
//! - `clipfind hotkey cmd+shift+f` - change the global shortcut
//! - `clipfind status` - show the current settings

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use clipfind::app::App;
use clipfind::clipboard::ArboardSource;
use clipfind::config::{self, Config};
use clipfind::directory_access::{PersistedBookmark, SecureDirectoryAccessor};
use clipfind::error::ResultExt;
use clipfind::file_search::FileSearchEngine;
use clipfind::hotkeys::GlobalHotkeyBackend;
use clipfind::logging;
use clipfind::orchestrator::{SearchOrchestrator, SearchOutcome, Trigger};
use clipfind::preferences::{JsonPreferences, PreferencesStore};
use clipfind::presenter::{self, ConsolePresenter, OutputFormat};
use clipfind::shortcuts::HotkeyBinding;
use clipfind::stdin_commands;

/// clipfind - find files named like the clipboard text
#[derive(Parser)]
#[command(name = "clipfind")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search your files for whatever is on the clipboard")]
#[command(long_about = None)]
struct Cli {
    /// Config file path (default: ~/.clipfind/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and the global hotkey (default)
    Watch {
        /// Only search when the hotkey is pressed
        #[arg(long)]
        no_auto_search: bool,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run a single search
    Search {
        query: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Open the folder of the first result
        #[arg(long)]
        reveal: bool,
    },

    /// Set the directory to search
    SetDir { path: PathBuf },

    /// Show or change matching options
    Options {
        #[arg(long)]
        case_sensitive: Option<bool>,

        #[arg(long)]
        fuzzy: Option<bool>,
    },

    /// Set the global shortcut, e.g. "cmd+shift+f"
    Hotkey { shortcut: String },

    /// Show current settings
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn format_for(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

fn open_preferences(config: &Config) -> Result<JsonPreferences> {
    let path = config.get_preferences_path();
    JsonPreferences::load(&path)
        .with_context(|| format!("Failed to load preferences from {}", path.display()))
}

fn build_orchestrator(
    config: &Config,
    format: OutputFormat,
) -> Result<SearchOrchestrator<JsonPreferences, ConsolePresenter>> {
    Ok(SearchOrchestrator::new(
        open_preferences(config)?,
        ConsolePresenter::stdout(format),
        SecureDirectoryAccessor::default(),
        FileSearchEngine::new(&config.get_search_program()),
    ))
}

fn watch(config: &Config, no_auto_search: bool, json: bool) -> Result<ExitCode> {
    let orchestrator = build_orchestrator(config, format_for(json))?;
    let binding = orchestrator
        .preferences()
        .hotkey_binding()
        .unwrap_or_else(|| config.get_hotkey());

    let mut app = App::new(
        orchestrator,
        Box::new(ArboardSource::new()),
        GlobalHotkeyBackend::new(),
        config.get_poll_interval(),
    );
    app.register_hotkey(binding);
    app.set_auto_search(config.get_auto_search() && !no_auto_search);
    stdin_commands::start_stdin_listener(app.sender());

    app.run_with_platform_events();
    Ok(ExitCode::SUCCESS)
}

fn search(config: &Config, query: String, json: bool, reveal: bool) -> Result<ExitCode> {
    let mut orchestrator = build_orchestrator(config, format_for(json))?;
    let outcome = orchestrator.handle_trigger(Trigger::manual(query));

    if reveal {
        if let Some(first) = orchestrator.presenter().last_results().first() {
            presenter::reveal(first).log_err();
        }
    }

    Ok(match outcome {
        SearchOutcome::Published { .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn set_dir(config: &Config, path: PathBuf) -> Result<ExitCode> {
    let mut prefs = open_preferences(config)?;
    let bookmark = PersistedBookmark::create(&path)
        .with_context(|| format!("Cannot use {} as search directory", path.display()))?;
    println!(
        "Search directory: {}",
        bookmark.resolved.as_deref().unwrap_or(&bookmark.path).display()
    );
    prefs.save_search_directory_bookmark(bookmark);
    Ok(ExitCode::SUCCESS)
}

fn options(config: &Config, case_sensitive: Option<bool>, fuzzy: Option<bool>) -> Result<ExitCode> {
    let mut prefs = open_preferences(config)?;
    if let Some(value) = case_sensitive {
        prefs.set_case_sensitive(value);
    }
    if let Some(value) = fuzzy {
        prefs.set_fuzzy_matching(value);
    }
    let options = prefs.search_options();
    println!("Case sensitive: {}", options.case_sensitive);
    println!("Fuzzy matching: {}", options.fuzzy_matching);
    Ok(ExitCode::SUCCESS)
}

fn hotkey(config: &Config, shortcut: &str) -> Result<ExitCode> {
    let binding = HotkeyBinding::parse(shortcut)
        .with_context(|| format!("Invalid shortcut '{}'", shortcut))?;
    let mut prefs = open_preferences(config)?;
    prefs.set_hotkey_binding(binding);
    println!("Hotkey: {}", binding);
    Ok(ExitCode::SUCCESS)
}

fn status(config: &Config, json: bool) -> Result<ExitCode> {
    let prefs = open_preferences(config)?;
    let options = prefs.search_options();
    let hotkey = prefs
        .hotkey_binding()
        .unwrap_or_else(|| config.get_hotkey());
    let directory = prefs
        .search_directory_bookmark()
        .map(|b| b.resolved.unwrap_or(b.path));

    if json {
        let value = serde_json::json!({
            "searchDirectory": directory,
            "caseSensitive": options.case_sensitive,
            "fuzzyMatching": options.fuzzy_matching,
            "hotkey": hotkey.display(),
            "allowedExtensions": prefs.data().allowed_extensions,
            "autoSearch": config.get_auto_search(),
            "pollIntervalMs": config.get_poll_interval().as_millis() as u64,
            "searchProgram": config.get_search_program(),
            "preferencesPath": prefs.path(),
            "logPath": logging::log_path(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match &directory {
            Some(dir) => println!("Search directory: {}", dir.display()),
            None => println!("Search directory: (not set)"),
        }
        println!("Case sensitive:   {}", options.case_sensitive);
        println!("Fuzzy matching:   {}", options.fuzzy_matching);
        println!("Hotkey:           {}", hotkey);
        println!("Auto search:      {}", config.get_auto_search());
        println!("Search program:   {}", config.get_search_program());
        println!("Preferences:      {}", prefs.path().display());
        println!("Log file:         {}", logging::log_path().display());
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep alive for the whole run; dropping flushes the log file
    let _log_guard = logging::init();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };

    match cli.command.unwrap_or(Commands::Watch {
        no_auto_search: false,
        json: false,
    }) {
        Commands::Watch {
            no_auto_search,
            json,
        } => watch(&config, no_auto_search, json),
        Commands::Search {
            query,
            json,
            reveal,
        } => search(&config, query, json, reveal),
        Commands::SetDir { path } => set_dir(&config, path),
        Commands::Options {
            case_sensitive,
            fuzzy,
        } => options(&config, case_sensitive, fuzzy),
        Commands::Hotkey { shortcut } => hotkey(&config, &shortcut),
        Commands::Status { json } => status(&config, json),
    }
}
