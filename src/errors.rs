use thiserror::Error;

use crate::types::WindowKind;

/// Custom error types for window, settings and hotkey operations
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Window not found: {kind}")]
    WindowNotFound { kind: WindowKind },

    #[error("Window already destroyed: {kind}")]
    WindowDestroyed { kind: WindowKind },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Host runtime error: {message}")]
    Host { message: String },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("Invalid accelerator: {accelerator}")]
    InvalidAccelerator { accelerator: String },

    #[error("Unknown hotkey: {id}")]
    UnknownHotkey { id: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl WindowError {
    /// Create a user-friendly error message for display in the frontend
    pub fn user_message(&self) -> String {
        match self {
            WindowError::WindowNotFound { kind } => {
                format!("The {} window is not open.", kind)
            }
            WindowError::WindowDestroyed { kind } => {
                format!("The {} window was closed before the operation could finish.", kind)
            }
            WindowError::InvalidUrl { url } => {
                format!("'{}' is not a valid address.", url)
            }
            WindowError::Host { message } => {
                format!("The window system reported an error: {}", message)
            }
            WindowError::Settings { message } => {
                format!("Settings could not be saved or loaded: {}", message)
            }
            WindowError::InvalidAccelerator { accelerator } => {
                format!("'{}' is not a valid keyboard shortcut.", accelerator)
            }
            WindowError::UnknownHotkey { id } => {
                format!("There is no shortcut named '{}'.", id)
            }
            WindowError::Serialization { message } => {
                format!("Data could not be converted: {}", message)
            }
        }
    }
}

impl From<serde_json::Error> for WindowError {
    fn from(error: serde_json::Error) -> Self {
        WindowError::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<std::io::Error> for WindowError {
    fn from(error: std::io::Error) -> Self {
        WindowError::Settings {
            message: error.to_string(),
        }
    }
}

/// Helper trait to add context to IO errors
pub trait IoErrorContext<T> {
    fn with_path_context(self, path: &std::path::Path, operation: &str) -> WindowResult<T>;
}

impl<T> IoErrorContext<T> for Result<T, std::io::Error> {
    fn with_path_context(self, path: &std::path::Path, operation: &str) -> WindowResult<T> {
        self.map_err(|e| WindowError::Settings {
            message: format!("Failed to {} '{}': {}", operation, path.display(), e),
        })
    }
}

/// Result type alias for window and settings operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Convert WindowError to String for Tauri commands
impl From<WindowError> for String {
    fn from(error: WindowError) -> Self {
        error.user_message()
    }
}
