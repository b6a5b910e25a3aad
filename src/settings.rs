//! # Settings Persistence
//!
//! Narrow key/value interface the window core uses to persist zoom level,
//! always-on-top and main window bounds. The core reads once at startup and
//! writes on every change; it never depends on the storage format.
//!
//! ## Storage Location
//!
//! `FileSettingsStore` keeps a flat JSON object in
//! `<config_dir>/gemini-desktop/settings.json`:
//!
//! ```json
//! {
//!   "zoomLevel": 110,
//!   "alwaysOnTop": false,
//!   "windowBounds": { "width": 1200.0, "height": 800.0, "x": 100, "y": 80, "maximized": false }
//! }
//! ```
//!
//! A missing file yields defaults. A corrupt file is logged and treated as empty
//! so a bad write never prevents the shell from starting.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{IoErrorContext, WindowError, WindowResult};
use crate::types::{WindowBounds, ZoomLevel};

pub const ZOOM_LEVEL_KEY: &str = "zoomLevel";
pub const ALWAYS_ON_TOP_KEY: &str = "alwaysOnTop";
pub const WINDOW_BOUNDS_KEY: &str = "windowBounds";

const SETTINGS_DIR_NAME: &str = "gemini-desktop";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Key/value settings collaborator
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> WindowResult<()>;
}

/// Read `key` and deserialize it, ignoring values of the wrong shape
pub fn read_setting<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("⚠️ Ignoring malformed setting '{}': {}", key, e);
            None
        }
    }
}

/// Serialize `value` and store it under `key`
pub fn write_setting<T: Serialize>(store: &mut dyn SettingsStore, key: &str, value: &T) -> WindowResult<()> {
    let value = serde_json::to_value(value)?;
    store.set(key, value)
}

/// Typed snapshot of everything the window core persists
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    pub zoom_level: ZoomLevel,
    pub always_on_top: bool,
    pub window_bounds: WindowBounds,
}

impl AppSettings {
    /// Read all persisted values, falling back to defaults per key
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self {
            zoom_level: read_setting::<u32>(store, ZOOM_LEVEL_KEY)
                .map(ZoomLevel::new)
                .unwrap_or_default(),
            always_on_top: read_setting(store, ALWAYS_ON_TOP_KEY).unwrap_or(false),
            window_bounds: read_setting(store, WINDOW_BOUNDS_KEY).unwrap_or_default(),
        }
    }
}

/// Settings persisted as a single JSON object on disk
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl FileSettingsStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match load_settings_file(&path) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("⚠️ Starting with empty settings: {}", e);
                Map::new()
            }
        };
        Self { path, values }
    }

    /// Open the store in the user's config directory
    pub fn open_default() -> WindowResult<Self> {
        Ok(Self::open(default_settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> WindowResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_path_context(parent, "create settings directory")?;
            }
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content).with_path_context(&self.path, "write")
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> WindowResult<()> {
        if self.values.get(key) == Some(&value) {
            return Ok(());
        }
        self.values.insert(key.to_string(), value);
        self.persist()
    }
}

/// Settings kept in memory only
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    values: HashMap<String, Value>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> WindowResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// `<config_dir>/gemini-desktop/settings.json`
pub fn default_settings_path() -> WindowResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| WindowError::Settings {
        message: "Could not determine config directory".to_string(),
    })?;
    Ok(config_dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

fn load_settings_file(path: &Path) -> WindowResult<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let content = fs::read_to_string(path).with_path_context(path, "read")?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content)? {
        Value::Object(values) => Ok(values),
        _ => Err(WindowError::Settings {
            message: format!("'{}' does not contain a JSON object", path.display()),
        }),
    }
}
