// Module declarations
pub mod constants;
pub mod errors;
pub mod events;
pub mod host;
pub mod hotkeys;
pub mod menu;
pub mod navigation;
pub mod platform;
pub mod settings;
pub mod types;
pub mod window;
pub mod window_manager;

#[cfg(feature = "desktop")]
pub mod commands;
#[cfg(feature = "desktop")]
pub mod global_shortcuts;
#[cfg(feature = "desktop")]
pub mod tauri_host;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for commonly used types
pub use errors::{WindowError, WindowResult};
pub use events::{EventBus, ManagerEvent};
pub use host::{ContentSource, EventResponse, HostRuntime, NewWindowResponse, WindowConfig, WindowEvent};
pub use navigation::{classify, DomainClassification, DomainPolicy, NavigationDecision, PopupDecision};
pub use platform::PlatformPolicy;
pub use types::{Display, OptionsTab, Point, Rect, Size, WindowBounds, WindowHandle, WindowKind, ZoomLevel};
pub use window_manager::{TrayAction, WindowManager};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .setup(|app| {
            tauri_host::setup(app.handle())?;
            Ok(())
        })
        .on_menu_event(tauri_host::handle_menu_event)
        .invoke_handler(tauri::generate_handler![
            commands::get_zoom_level,
            commands::zoom_in,
            commands::zoom_out,
            commands::reset_zoom,
            commands::get_always_on_top,
            commands::set_always_on_top,
            commands::open_options,
            commands::open_sign_in,
            commands::toggle_quick_chat,
            commands::submit_quick_chat,
            commands::hide_quick_chat,
            commands::restore_main_window,
            commands::get_hotkeys,
            commands::set_hotkey_accelerator,
            commands::set_hotkey_enabled,
            commands::show_edit_menu
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
