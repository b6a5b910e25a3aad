//! # Global Shortcuts
//!
//! OS-level registration of the global-scoped hotkeys. The registry in the
//! window manager is the source of truth; this module mirrors its enabled
//! global bindings into `tauri-plugin-global-shortcut` and routes presses
//! back to [`WindowManager::handle_hotkey`](crate::WindowManager::handle_hotkey).
//!
//! Registration is redone wholesale whenever a [`ShortcutSynchronizer`]
//! batch says a global binding changed.

use tauri::AppHandle;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

use crate::errors::{WindowError, WindowResult};
use crate::hotkeys::{HotkeyId, ShortcutSynchronizer};
use crate::tauri_host::with_manager;

impl From<tauri_plugin_global_shortcut::Error> for WindowError {
    fn from(error: tauri_plugin_global_shortcut::Error) -> Self {
        WindowError::Host {
            message: error.to_string(),
        }
    }
}

/// Replace every OS registration with the manager's current global bindings.
///
/// Accelerators the OS layer cannot parse or claim are skipped with a warning
/// so one conflicting binding does not take the others down.
pub fn register_global_shortcuts(app: &AppHandle) -> WindowResult<usize> {
    let bindings = with_manager(app, |manager| Ok(manager.hotkeys().global_shortcuts()))?;
    let shortcuts = app.global_shortcut();
    shortcuts.unregister_all()?;

    let mut registered = 0;
    for (id, accelerator) in bindings {
        let shortcut = match accelerator.parse::<Shortcut>() {
            Ok(shortcut) => shortcut,
            Err(e) => {
                log::warn!("⚠️ Cannot register '{}' for hotkey '{}': {}", accelerator, id, e);
                continue;
            }
        };

        let result = shortcuts.on_shortcut(shortcut, move |app, _shortcut, event| {
            if event.state() == ShortcutState::Pressed {
                trigger_on_main_thread(app, id);
            }
        });
        match result {
            Ok(()) => {
                registered += 1;
                log::info!("⌨️ Registered global hotkey '{}' as {}", id, accelerator);
            }
            Err(e) => log::warn!("⚠️ OS refused hotkey '{}' ({}): {}", id, accelerator, e),
        }
    }
    Ok(registered)
}

fn trigger_on_main_thread(app: &AppHandle, id: HotkeyId) {
    let main_thread_app = app.clone();
    let posted = app.run_on_main_thread(move || {
        if let Err(e) = with_manager(&main_thread_app, |manager| manager.handle_hotkey(id)) {
            log::error!("❌ Hotkey '{}' failed: {}", id, e);
        }
    });
    if let Err(e) = posted {
        log::warn!("⚠️ Could not deliver hotkey '{}': {}", id, e);
    }
}

/// Register now and keep the registration in sync with hotkey edits
pub fn install(app: &AppHandle, synchronizer: ShortcutSynchronizer) {
    if let Err(e) = register_global_shortcuts(app) {
        log::error!("❌ Failed to register global hotkeys: {}", e);
    }

    let sync_app = app.clone();
    tauri::async_runtime::spawn(synchronizer.run(move || {
        let main_thread_app = sync_app.clone();
        sync_app
            .run_on_main_thread(move || {
                if let Err(e) = register_global_shortcuts(&main_thread_app) {
                    log::error!("❌ Failed to re-register global hotkeys: {}", e);
                }
            })
            .map_err(WindowError::from)
    }));
}
