//! Application context and the single control loop.
//!
//! `App` owns the clipboard watcher, the hotkey registrar and the
//! orchestrator. The watcher thread, the hotkey callback and the stdin
//! listener only send `AppEvent`s; every search runs on the thread that
//! calls `App::run` or `App::run_with_platform_events`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use tracing::{debug, info};

use crate::clipboard::{ChangeHandler, ClipboardSnapshot, ClipboardSource, ClipboardWatcher};
use crate::error::ClipfindError;
use crate::event_loop;
use crate::hotkeys::{HotkeyBackend, HotkeyHandler, HotkeyRegistrar};
use crate::logging;
use crate::orchestrator::{SearchOrchestrator, SearchOutcome, Trigger, TriggerSource};
use crate::preferences::PreferencesStore;
use crate::presenter::Presenter;
use crate::shortcuts::HotkeyBinding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ClipboardChanged(ClipboardSnapshot),
    HotkeyPressed,
    ManualSearch(String),
    SetAutoSearch(bool),
    Shutdown,
}

pub struct App<B: HotkeyBackend, S: PreferencesStore, P: Presenter> {
    orchestrator: SearchOrchestrator<S, P>,
    watcher: ClipboardWatcher,
    registrar: HotkeyRegistrar<B>,
    sender: Sender<AppEvent>,
    receiver: Receiver<AppEvent>,
    auto_search: bool,
}

impl<B: HotkeyBackend, S: PreferencesStore, P: Presenter> App<B, S, P> {
    /// Wire the watcher and registrar to the event channel.
    ///
    /// The watcher is primed with the current clipboard but not started; call
    /// `set_auto_search(true)` to start it.
    pub fn new(
        orchestrator: SearchOrchestrator<S, P>,
        clipboard: Box<dyn ClipboardSource>,
        hotkey_backend: B,
        poll_interval: Duration,
    ) -> Self {
        // Unbounded: the watcher thread must never block while `stop` joins it
        let (sender, receiver) = async_channel::unbounded();

        let clipboard_tx = sender.clone();
        let on_change: ChangeHandler = Arc::new(move |snapshot| {
            if clipboard_tx
                .send_blocking(AppEvent::ClipboardChanged(snapshot))
                .is_err()
            {
                logging::log("CLIPBOARD", "Event channel closed, dropping change");
            }
        });
        let watcher = ClipboardWatcher::new(clipboard, poll_interval, on_change);
        watcher.prime();

        let hotkey_tx = sender.clone();
        let trigger: HotkeyHandler = Arc::new(move || {
            if hotkey_tx.send_blocking(AppEvent::HotkeyPressed).is_err() {
                logging::log("HOTKEY", "Event channel closed, cannot send");
            }
        });
        let registrar = HotkeyRegistrar::new(hotkey_backend, trigger);

        Self {
            orchestrator,
            watcher,
            registrar,
            sender,
            receiver,
            auto_search: false,
        }
    }

    /// Sender for other threads (stdin listener, embedders) to drive the loop.
    pub fn sender(&self) -> Sender<AppEvent> {
        self.sender.clone()
    }

    /// Register the global hotkey. A failure is shown as a notification and
    /// the app keeps running without a hotkey.
    pub fn register_hotkey(&mut self, binding: HotkeyBinding) -> bool {
        match self.registrar.register(binding) {
            Ok(()) => true,
            Err(e) => {
                let err = ClipfindError::from(e);
                err.report("HOTKEY", Some(&binding.display()));
                let (title, message) = err.notification();
                self.orchestrator
                    .presenter_mut()
                    .show_notification(&title, &message);
                false
            }
        }
    }

    /// Start or stop searching on clipboard changes. The hotkey is unaffected.
    pub fn set_auto_search(&mut self, enabled: bool) {
        self.auto_search = enabled;
        if enabled {
            // Text copied while auto-search was off must not fire on resume
            self.watcher.prime();
            self.watcher.start();
        } else {
            self.watcher.stop();
        }
        logging::log(
            "APP",
            &format!(
                "Auto-search {}",
                if enabled { "enabled" } else { "disabled" }
            ),
        );
    }

    pub fn auto_search(&self) -> bool {
        self.auto_search
    }

    pub fn hotkey_binding(&self) -> Option<HotkeyBinding> {
        self.registrar.binding()
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator<S, P> {
        &self.orchestrator
    }

    /// Block on the event channel until `Shutdown` or every sender is gone.
    pub fn run(&mut self) {
        info!(auto_search = self.auto_search, "Control loop started");
        while let Ok(first) = self.receiver.recv_blocking() {
            let mut batch = vec![first];
            batch.extend(self.drain());
            if self.process_batch(batch).is_break() {
                break;
            }
        }
        info!("Control loop stopped");
    }

    /// Run the control loop on the main thread, servicing the OS event queue
    /// between events so hotkey presses get delivered.
    ///
    /// Same as `run` when the platform delivers hotkeys on its own thread or
    /// no hotkey is registered.
    pub fn run_with_platform_events(&mut self) {
        if !event_loop::NEEDS_PUMP || !self.registrar.is_registered() {
            return self.run();
        }
        event_loop::prepare();
        self.run_pumped(event_loop::pump);
    }

    fn run_pumped(&mut self, mut pump: impl FnMut(Duration)) {
        info!(auto_search = self.auto_search, "Control loop started with platform events");
        loop {
            let batch = self.drain();
            if batch.is_empty() {
                pump(event_loop::PUMP_INTERVAL);
                continue;
            }
            if self.process_batch(batch).is_break() {
                break;
            }
        }
        info!("Control loop stopped");
    }

    /// Process whatever is queued without blocking.
    pub fn process_pending(&mut self) -> ControlFlow<(), Option<SearchOutcome>> {
        let batch = self.drain();
        self.process_batch(batch)
    }

    fn drain(&self) -> Vec<AppEvent> {
        std::iter::from_fn(|| self.receiver.try_recv().ok()).collect()
    }

    /// Apply events in order. Of the triggers with text only the last one is
    /// searched; the earlier ones are superseded before they start.
    ///
    /// A trigger without text never displaces one with text. It only runs
    /// (and notifies) when nothing searchable is queued.
    pub fn process_batch(&mut self, events: Vec<AppEvent>) -> ControlFlow<(), Option<SearchOutcome>> {
        let mut latest: Option<Trigger> = None;
        let mut blank: Option<Trigger> = None;
        let mut superseded = 0usize;

        for event in events {
            let trigger = match event {
                AppEvent::Shutdown => {
                    logging::log("APP", "Shutdown requested");
                    return ControlFlow::Break(());
                }
                AppEvent::SetAutoSearch(enabled) => {
                    self.set_auto_search(enabled);
                    continue;
                }
                AppEvent::ClipboardChanged(snapshot) => {
                    if !self.auto_search {
                        debug!("Auto-search off, ignoring clipboard change");
                        continue;
                    }
                    Trigger::clipboard(snapshot.text)
                }
                AppEvent::HotkeyPressed => Trigger::hotkey(self.watcher.read_once()),
                AppEvent::ManualSearch(query) => Trigger::manual(query),
            };
            if trigger.query().is_none() {
                if trigger.source != TriggerSource::Clipboard || blank.is_none() {
                    blank = Some(trigger);
                }
                continue;
            }
            if latest.replace(trigger).is_some() {
                superseded += 1;
            }
        }

        if superseded > 0 {
            debug!(superseded, "Dropped queued triggers in favour of the newest");
        }

        ControlFlow::Continue(
            latest
                .or(blank)
                .map(|trigger| self.orchestrator.handle_trigger(trigger)),
        )
    }
}
