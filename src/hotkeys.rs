use global_hotkey::{
    hotkey::HotKey, Error as OsHotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::logging;
use crate::shortcuts::HotkeyBinding;

/// Callback type for hotkey actions - uses Arc<dyn Fn()> for repeated invocation
pub type HotkeyHandler = Arc<dyn Fn() + Send + Sync>;

/// Callback the backend invokes with the id of a pressed hotkey.
pub type PressListener = Arc<dyn Fn(u32) + Send + Sync>;

/// Id value meaning "no hotkey registered".
const NO_HOTKEY: u32 = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("Hotkey registration failed: {0}")]
    RegistrationFailed(String),
}

/// OS input layer seam.
///
/// `install` sets the single input-event listener; `register` claims one
/// global shortcut and returns its id.
pub trait HotkeyBackend {
    fn install(&mut self, listener: PressListener) -> Result<(), HotkeyError>;
    fn uninstall(&mut self);
    fn register(&mut self, binding: &HotkeyBinding) -> Result<u32, HotkeyError>;
    fn unregister(&mut self, id: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveHotkey {
    binding: HotkeyBinding,
    id: u32,
}

/// Owns the one active global shortcut and dispatches presses to the trigger.
pub struct HotkeyRegistrar<B: HotkeyBackend> {
    backend: B,
    trigger: HotkeyHandler,
    active: Option<ActiveHotkey>,
    active_id: Arc<AtomicU32>,
}

impl<B: HotkeyBackend> HotkeyRegistrar<B> {
    pub fn new(backend: B, trigger: HotkeyHandler) -> Self {
        Self {
            backend,
            trigger,
            active: None,
            active_id: Arc::new(AtomicU32::new(NO_HOTKEY)),
        }
    }

    /// Install the listener and claim `binding`, replacing any previous binding.
    ///
    /// The previous registration is fully removed before the new one is attempted.
    pub fn register(&mut self, binding: HotkeyBinding) -> Result<(), HotkeyError> {
        self.unregister();

        let active_id = Arc::clone(&self.active_id);
        let trigger = Arc::clone(&self.trigger);
        let listener: PressListener = Arc::new(move |id| {
            if id != NO_HOTKEY && id == active_id.load(Ordering::SeqCst) {
                trigger();
            }
        });

        if let Err(e) = self.backend.install(listener) {
            logging::log("HOTKEY", &format!("Failed to install hotkey listener: {}", e));
            return Err(e);
        }

        match self.backend.register(&binding) {
            Ok(id) => {
                self.active_id.store(id, Ordering::SeqCst);
                self.active = Some(ActiveHotkey { binding, id });
                logging::log(
                    "HOTKEY",
                    &format!("Registered global hotkey {} (id: {})", binding, id),
                );
                Ok(())
            }
            Err(e) => {
                self.backend.uninstall();
                logging::log("HOTKEY", &e.to_string());
                Err(e)
            }
        }
    }

    /// Remove the shortcut and the listener. No-op when nothing is registered.
    pub fn unregister(&mut self) {
        if let Some(active) = self.active.take() {
            self.active_id.store(NO_HOTKEY, Ordering::SeqCst);
            self.backend.unregister(active.id);
            self.backend.uninstall();
            logging::log(
                "HOTKEY",
                &format!("Unregistered global hotkey {} (id: {})", active.binding, active.id),
            );
        }
    }

    pub fn binding(&self) -> Option<HotkeyBinding> {
        self.active.map(|a| a.binding)
    }

    pub fn is_registered(&self) -> bool {
        self.active.is_some()
    }
}

impl<B: HotkeyBackend> Drop for HotkeyRegistrar<B> {
    fn drop(&mut self) {
        self.unregister();
    }
}

// =============================================================================
// global-hotkey backend
// =============================================================================

/// Format a hotkey registration error with helpful context
fn format_hotkey_error(e: &OsHotkeyError, shortcut_display: &str) -> String {
    match e {
        OsHotkeyError::AlreadyRegistered(hk) => {
            format!(
                "Hotkey '{}' is already registered by another application (ID: {}). \
                 Try a different shortcut or close the conflicting app.",
                shortcut_display,
                hk.id()
            )
        }
        OsHotkeyError::FailedToRegister(msg) => {
            format!(
                "System rejected hotkey '{}': {}. This shortcut may be reserved by the OS.",
                shortcut_display, msg
            )
        }
        OsHotkeyError::OsError(os_err) => {
            format!(
                "OS error registering '{}': {}. Check system hotkey settings.",
                shortcut_display, os_err
            )
        }
        other => format!(
            "Failed to register hotkey '{}': {}",
            shortcut_display, other
        ),
    }
}

/// Backend over `global_hotkey`.
///
/// NOTE: Must be created on the main thread. On macOS and Windows presses are
/// only delivered while that thread services its event queue, see
/// `App::run_with_platform_events`.
#[derive(Default)]
pub struct GlobalHotkeyBackend {
    manager: Option<GlobalHotKeyManager>,
    hotkeys: HashMap<u32, HotKey>,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn install(&mut self, listener: PressListener) -> Result<(), HotkeyError> {
        if self.manager.is_none() {
            let manager = GlobalHotKeyManager::new().map_err(|e| {
                HotkeyError::RegistrationFailed(format!("Failed to create hotkey manager: {}", e))
            })?;
            self.manager = Some(manager);
        }

        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            // Only respond to key PRESS, not release
            if event.state == HotKeyState::Pressed {
                listener(event.id);
            }
        }));
        Ok(())
    }

    fn uninstall(&mut self) {
        GlobalHotKeyEvent::set_event_handler(None::<fn(GlobalHotKeyEvent)>);
    }

    fn register(&mut self, binding: &HotkeyBinding) -> Result<u32, HotkeyError> {
        let manager = self.manager.as_ref().ok_or_else(|| {
            HotkeyError::RegistrationFailed("Hotkey listener is not installed".to_string())
        })?;

        let hotkey = binding.to_hotkey().ok_or_else(|| {
            HotkeyError::RegistrationFailed(format!(
                "Unsupported key code {} in hotkey '{}'",
                binding.key_code, binding
            ))
        })?;

        manager
            .register(hotkey)
            .map_err(|e| HotkeyError::RegistrationFailed(format_hotkey_error(&e, &binding.display())))?;

        let id = hotkey.id();
        self.hotkeys.insert(id, hotkey);
        Ok(id)
    }

    fn unregister(&mut self, id: u32) {
        let (Some(manager), Some(hotkey)) = (self.manager.as_ref(), self.hotkeys.remove(&id)) else {
            return;
        };
        if let Err(e) = manager.unregister(hotkey) {
            // Continue anyway - the internal tracking is already updated
            logging::log(
                "HOTKEY",
                &format!("Warning: Failed to unregister hotkey (id: {}): {}", id, e),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Install,
        Uninstall,
        Register(u32),
        Unregister(u32),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
        active: Vec<u32>,
        listener: Option<PressListener>,
    }

    /// Records backend calls; ids are the key code plus one.
    #[derive(Clone, Default)]
    struct FakeBackend {
        state: Arc<Mutex<Recorder>>,
        fail_install: bool,
        rejected_key_code: Option<u32>,
    }

    impl FakeBackend {
        fn press(&self, id: u32) {
            let listener = self.state.lock().listener.clone();
            if let Some(listener) = listener {
                listener(id);
            }
        }

        fn ops(&self) -> Vec<Op> {
            self.state.lock().ops.clone()
        }

        fn active(&self) -> Vec<u32> {
            self.state.lock().active.clone()
        }
    }

    impl HotkeyBackend for FakeBackend {
        fn install(&mut self, listener: PressListener) -> Result<(), HotkeyError> {
            let mut state = self.state.lock();
            state.ops.push(Op::Install);
            if self.fail_install {
                return Err(HotkeyError::RegistrationFailed("no input layer".into()));
            }
            state.listener = Some(listener);
            Ok(())
        }

        fn uninstall(&mut self) {
            let mut state = self.state.lock();
            state.ops.push(Op::Uninstall);
            state.listener = None;
        }

        fn register(&mut self, binding: &HotkeyBinding) -> Result<u32, HotkeyError> {
            let id = binding.key_code + 1;
            let mut state = self.state.lock();
            state.ops.push(Op::Register(id));
            if self.rejected_key_code == Some(binding.key_code) || state.active.contains(&id) {
                return Err(HotkeyError::RegistrationFailed("already claimed".into()));
            }
            state.active.push(id);
            Ok(id)
        }

        fn unregister(&mut self, id: u32) {
            let mut state = self.state.lock();
            state.ops.push(Op::Unregister(id));
            state.active.retain(|a| *a != id);
        }
    }

    fn counting_trigger() -> (HotkeyHandler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            count,
        )
    }

    #[test]
    fn register_twice_unregisters_first() {
        let backend = FakeBackend::default();
        let (trigger, _) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);

        registrar.register(HotkeyBinding::new(3, 768)).unwrap();
        registrar.register(HotkeyBinding::new(4, 768)).unwrap();

        assert_eq!(backend.active(), vec![5]);
        assert_eq!(
            backend.ops(),
            vec![
                Op::Install,
                Op::Register(4),
                Op::Unregister(4),
                Op::Uninstall,
                Op::Install,
                Op::Register(5),
            ]
        );
        assert_eq!(registrar.binding(), Some(HotkeyBinding::new(4, 768)));
    }

    #[test]
    fn re_registering_same_binding_succeeds() {
        let backend = FakeBackend::default();
        let (trigger, _) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);

        registrar.register(HotkeyBinding::default()).unwrap();
        registrar.register(HotkeyBinding::default()).unwrap();
        assert_eq!(backend.active().len(), 1);
    }

    #[test]
    fn unregister_when_not_registered_is_noop() {
        let backend = FakeBackend::default();
        let (trigger, _) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);

        registrar.unregister();
        registrar.unregister();
        assert!(backend.ops().is_empty());
        assert!(!registrar.is_registered());
    }

    #[test]
    fn press_invokes_trigger_each_time() {
        let backend = FakeBackend::default();
        let (trigger, count) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);
        registrar.register(HotkeyBinding::new(3, 768)).unwrap();

        backend.press(4);
        backend.press(4);
        backend.press(4);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        // Presses for other ids are ignored
        backend.press(99);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn no_dispatch_after_unregister() {
        let backend = FakeBackend::default();
        let (trigger, count) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);
        registrar.register(HotkeyBinding::new(3, 768)).unwrap();
        let listener = backend.state.lock().listener.clone().unwrap();

        registrar.unregister();
        // A listener captured before removal must not fire either
        listener(4);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn os_rejection_is_reported_and_leaves_nothing_installed() {
        let backend = FakeBackend {
            rejected_key_code: Some(3),
            ..Default::default()
        };
        let (trigger, _) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);

        let result = registrar.register(HotkeyBinding::new(3, 768));
        assert!(matches!(result, Err(HotkeyError::RegistrationFailed(_))));
        assert!(!registrar.is_registered());
        assert!(backend.active().is_empty());
        assert_eq!(backend.ops().last(), Some(&Op::Uninstall));
    }

    #[test]
    fn install_failure_is_reported() {
        let backend = FakeBackend {
            fail_install: true,
            ..Default::default()
        };
        let (trigger, _) = counting_trigger();
        let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);

        let result = registrar.register(HotkeyBinding::default());
        assert!(matches!(result, Err(HotkeyError::RegistrationFailed(_))));
        assert_eq!(backend.ops(), vec![Op::Install]);
    }

    #[test]
    fn drop_unregisters() {
        let backend = FakeBackend::default();
        let (trigger, _) = counting_trigger();
        {
            let mut registrar = HotkeyRegistrar::new(backend.clone(), trigger);
            registrar.register(HotkeyBinding::default()).unwrap();
        }
        assert!(backend.active().is_empty());
    }

    // GlobalHotKeyManager may fail in test environments without a display;
    // only the tracking logic is checked when it can be created.
    #[test]
    fn global_backend_unregister_unknown_is_noop() {
        let mut backend = GlobalHotkeyBackend::new();
        backend.unregister(42);
        assert!(backend.hotkeys.is_empty());
    }

    #[test]
    fn global_backend_register_without_install_fails() {
        let mut backend = GlobalHotkeyBackend::new();
        let result = backend.register(&HotkeyBinding::default());
        assert!(matches!(result, Err(HotkeyError::RegistrationFailed(_))));
    }
}
