//! # Tauri Command Modules
//!
//! Commands the frontend can `invoke()`. They are thin wrappers: each one
//! locks the window manager, calls a single operation and converts the
//! error into the `String` Tauri hands back to JavaScript.
//!
//! ## Module Organization
//!
//! - `window_commands`: zoom, always-on-top, options, sign-in, quick chat,
//!   hotkeys and the edit context menu
//!
//! All commands are re-exported here and registered in `lib.rs`:
//!
//! ```rust,ignore
//! tauri::Builder::default()
//!     .invoke_handler(tauri::generate_handler![commands::zoom_in, /* ... */])
//! ```

// Window Commands Module
// Handles: zoom, main window pinning and restore, auxiliary windows, hotkeys
pub mod window_commands;

pub use window_commands::*;
