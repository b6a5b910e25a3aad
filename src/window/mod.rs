pub mod auth_window;
pub mod lifecycle;
pub mod main_window;
pub mod options_window;
pub mod quick_chat_window;

pub use auth_window::AuthWindow;
pub use lifecycle::{WindowContent, WindowRecord, WindowState};
pub use main_window::{MainWindow, TrayState};
pub use options_window::OptionsWindow;
pub use quick_chat_window::{compute_position, QuickChatWindow};
