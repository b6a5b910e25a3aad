//! # Window Commands
//!
//! Tauri commands the frontend uses to drive the window shell. All of them
//! are synchronous so Tauri runs them on the main thread, which is where the
//! window manager lives.
//!
//! ## Command Overview
//!
//! ### Zoom
//! - `get_zoom_level`, `zoom_in`, `zoom_out`, `reset_zoom`: return the level in percent
//!
//! ### Main window
//! - `get_always_on_top` / `set_always_on_top`
//! - `restore_main_window`: bring the main window back from the tray
//!
//! ### Auxiliary windows
//! - `open_options`: open or retarget the options window (`settings` or `about`)
//! - `open_sign_in`: start an identity flow in the auth window
//! - `toggle_quick_chat`, `hide_quick_chat`, `submit_quick_chat`
//!
//! ### Hotkeys
//! - `get_hotkeys`, `set_hotkey_accelerator`, `set_hotkey_enabled`
//!
//! ### Edit menu
//! - `show_edit_menu`: pop up Cut/Copy/Paste/Delete/Select All with the
//!   enablement reported by the page
//!
//! ## Error Handling
//!
//! Every command returns `Result<T, String>`. Errors are converted with
//! `WindowError::user_message()` so the frontend can show them as is.
//!
//! ```javascript
//! const level = await invoke('zoom_in');
//! await invoke('open_options', { tab: 'about' });
//! const submitted = await invoke('submit_quick_chat', { text: 'Hello' });
//! ```

use tauri::{AppHandle, State, WebviewWindow};

use crate::errors::{WindowError, WindowResult};
use crate::hotkeys::{HotkeyBinding, HotkeyId};
use crate::menu::EditFlags;
use crate::tauri_host::{with_manager, EditMenuState, TauriHost};
use crate::types::OptionsTab;
use crate::window_manager::WindowManager;

fn run<T>(
    app: &AppHandle,
    operation: impl FnOnce(&mut WindowManager<TauriHost>) -> WindowResult<T>,
) -> Result<T, String> {
    with_manager(app, operation).map_err(|e| e.into())
}

/// Current zoom level in percent
#[tauri::command]
pub fn get_zoom_level(app: AppHandle) -> Result<u32, String> {
    run(&app, |manager| Ok(manager.zoom_level().percent()))
}

/// Step the zoom level up. Stays at 200 once reached.
#[tauri::command]
pub fn zoom_in(app: AppHandle) -> Result<u32, String> {
    run(&app, |manager| Ok(manager.zoom_in().percent()))
}

/// Step the zoom level down. Stays at 50 once reached.
#[tauri::command]
pub fn zoom_out(app: AppHandle) -> Result<u32, String> {
    run(&app, |manager| Ok(manager.zoom_out().percent()))
}

#[tauri::command]
pub fn reset_zoom(app: AppHandle) -> Result<u32, String> {
    run(&app, |manager| Ok(manager.reset_zoom().percent()))
}

#[tauri::command]
pub fn get_always_on_top(app: AppHandle) -> Result<bool, String> {
    run(&app, |manager| Ok(manager.is_always_on_top()))
}

/// Pin or unpin the main window
///
/// # Returns
/// * `Ok(true)` - The setting changed
/// * `Ok(false)` - It already had this value
#[tauri::command]
pub fn set_always_on_top(app: AppHandle, enabled: bool) -> Result<bool, String> {
    run(&app, |manager| Ok(manager.set_always_on_top(enabled)))
}

/// Open the options window on `tab`, or switch an open one to it
///
/// # Arguments
/// * `tab` - `"settings"` (default when omitted) or `"about"`
#[tauri::command]
pub fn open_options(app: AppHandle, tab: Option<String>) -> Result<(), String> {
    let tab = match tab {
        Some(tab) => tab.parse::<OptionsTab>()?,
        None => OptionsTab::default(),
    };
    run(&app, |manager| manager.open_options(tab).map(|_| ()))
}

#[tauri::command]
pub fn open_sign_in(app: AppHandle) -> Result<(), String> {
    run(&app, |manager| manager.open_sign_in().map(|_| ()))
}

/// Show or hide the quick chat bar. Returns the new visibility.
#[tauri::command]
pub fn toggle_quick_chat(app: AppHandle) -> Result<bool, String> {
    run(&app, |manager| manager.toggle_quick_chat())
}

#[tauri::command]
pub fn hide_quick_chat(app: AppHandle) -> Result<(), String> {
    run(&app, |manager| {
        manager.hide_quick_chat();
        Ok(())
    })
}

/// Forward quick chat text to the main window
///
/// Blank input is ignored and reported as `Ok(false)`. Otherwise the quick
/// chat bar is hidden, the main window restored and the text delivered on
/// the `quick-chat:submit` channel.
#[tauri::command]
pub fn submit_quick_chat(app: AppHandle, text: String) -> Result<bool, String> {
    run(&app, |manager| manager.submit_quick_chat(&text))
}

#[tauri::command]
pub fn restore_main_window(app: AppHandle) -> Result<(), String> {
    run(&app, |manager| manager.restore_main_window().map(|_| ()))
}

#[tauri::command]
pub fn get_hotkeys(app: AppHandle) -> Result<Vec<HotkeyBinding>, String> {
    run(&app, |manager| Ok(manager.hotkeys().bindings().cloned().collect()))
}

/// Change a hotkey's accelerator
///
/// # Arguments
/// * `id` - `alwaysOnTop`, `peekAndHide`, `quickChat` or `zoom`
/// * `accelerator` - e.g. `CommandOrControl+Alt+T`
#[tauri::command]
pub fn set_hotkey_accelerator(app: AppHandle, id: String, accelerator: String) -> Result<(), String> {
    let id = id.parse::<HotkeyId>()?;
    run(&app, |manager| manager.set_hotkey_accelerator(id, &accelerator))
}

#[tauri::command]
pub fn set_hotkey_enabled(app: AppHandle, id: String, enabled: bool) -> Result<(), String> {
    let id = id.parse::<HotkeyId>()?;
    run(&app, |manager| manager.set_hotkey_enabled(id, enabled))
}

/// Pop up the edit context menu over the calling window
#[tauri::command]
pub fn show_edit_menu(
    window: WebviewWindow,
    state: State<'_, EditMenuState>,
    flags: EditFlags,
) -> Result<(), String> {
    let mut menu = state.0.lock().map_err(|_| "Edit menu is unavailable".to_string())?;
    menu.show(&window, flags).map_err(|e: WindowError| e.into())
}
