//! Settings Store Tests
//!
//! File-backed settings against a real temporary directory: first launch,
//! round trips across restarts, corrupt files and restored window bounds.

use gemini_desktop_lib::settings::{
    read_setting, write_setting, AppSettings, FileSettingsStore, MemorySettingsStore, SettingsStore,
    ALWAYS_ON_TOP_KEY, WINDOW_BOUNDS_KEY, ZOOM_LEVEL_KEY,
};
use gemini_desktop_lib::WindowBounds;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test utilities for better isolation and common operations
struct TestEnv {
    #[allow(dead_code)] // Required for automatic cleanup
    temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestEnv {
    /// Create a new isolated test environment with temporary directory
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("gemini-desktop").join("settings.json");

        TestEnv { temp_dir, path }
    }

    /// Write raw content where the store expects its file
    fn write_raw(&self, content: &str) {
        fs::create_dir_all(self.path.parent().unwrap()).unwrap();
        fs::write(&self.path, content).unwrap();
    }

    fn read_raw(&self) -> String {
        fs::read_to_string(&self.path).unwrap()
    }
}

#[test]
fn test_first_launch_uses_defaults_without_touching_disk() {
    let env = TestEnv::new();
    let store = FileSettingsStore::open(&env.path);

    let settings = AppSettings::load(&store);
    assert_eq!(settings.zoom_level.percent(), 100);
    assert!(!settings.always_on_top);
    assert_eq!(settings.window_bounds, WindowBounds::default());
    assert!(!env.path.exists());
}

#[test]
fn test_values_survive_restart() {
    let env = TestEnv::new();
    {
        let mut store = FileSettingsStore::open(&env.path);
        write_setting(&mut store, ZOOM_LEVEL_KEY, &150u32).unwrap();
        write_setting(&mut store, ALWAYS_ON_TOP_KEY, &true).unwrap();
        write_setting(
            &mut store,
            WINDOW_BOUNDS_KEY,
            &WindowBounds {
                width: 1400.0,
                height: 900.0,
                x: Some(40),
                y: Some(60),
                maximized: false,
            },
        )
        .unwrap();
    }

    let settings = AppSettings::load(&FileSettingsStore::open(&env.path));
    assert_eq!(settings.zoom_level.percent(), 150);
    assert!(settings.always_on_top);
    assert_eq!(settings.window_bounds.width, 1400.0);
    assert_eq!(settings.window_bounds.x, Some(40));
}

#[test]
fn test_file_is_pretty_json_object() {
    let env = TestEnv::new();
    let mut store = FileSettingsStore::open(&env.path);
    write_setting(&mut store, ZOOM_LEVEL_KEY, &110u32).unwrap();

    let raw = env.read_raw();
    assert!(raw.contains('\n'));
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, json!({ "zoomLevel": 110 }));
}

#[test]
fn test_unknown_keys_are_preserved() {
    let env = TestEnv::new();
    env.write_raw(r#"{ "theme": "dark", "zoomLevel": 90 }"#);

    let mut store = FileSettingsStore::open(&env.path);
    write_setting(&mut store, ALWAYS_ON_TOP_KEY, &true).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&env.read_raw()).unwrap();
    assert_eq!(parsed["theme"], "dark");
    assert_eq!(parsed["zoomLevel"], 90);
    assert_eq!(parsed["alwaysOnTop"], true);
}

#[test]
fn test_corrupt_file_starts_empty_and_is_repaired_on_write() {
    let env = TestEnv::new();
    env.write_raw("{\"zoomLevel\": 1");

    let mut store = FileSettingsStore::open(&env.path);
    assert_eq!(AppSettings::load(&store), AppSettings::default());

    write_setting(&mut store, ZOOM_LEVEL_KEY, &75u32).unwrap();
    let reopened = FileSettingsStore::open(&env.path);
    assert_eq!(AppSettings::load(&reopened).zoom_level.percent(), 75);
}

#[test]
fn test_non_object_file_is_ignored() {
    let env = TestEnv::new();
    env.write_raw("[1, 2, 3]");

    let store = FileSettingsStore::open(&env.path);
    assert!(store.get(ZOOM_LEVEL_KEY).is_none());
}

#[test]
fn test_stored_zoom_is_snapped_to_a_step() {
    let mut store = MemorySettingsStore::new();
    store.set(ZOOM_LEVEL_KEY, json!(118)).unwrap();
    assert_eq!(AppSettings::load(&store).zoom_level.percent(), 125);

    store.set(ZOOM_LEVEL_KEY, json!(9000)).unwrap();
    assert_eq!(AppSettings::load(&store).zoom_level.percent(), 200);
}

#[test]
fn test_read_setting_rejects_wrong_shape() {
    let mut store = MemorySettingsStore::new();
    store.set(ALWAYS_ON_TOP_KEY, json!("yes")).unwrap();

    assert_eq!(read_setting::<bool>(&store, ALWAYS_ON_TOP_KEY), None);
    assert!(!AppSettings::load(&store).always_on_top);
}

#[test]
fn test_saved_bounds_are_clamped_on_restore() {
    let mut store = MemorySettingsStore::new();
    store
        .set(
            WINDOW_BOUNDS_KEY,
            json!({ "width": 5000.0, "height": 200.0, "x": 4000, "y": -900, "maximized": true }),
        )
        .unwrap();

    let restored = AppSettings::load(&store).window_bounds.validated();
    assert_eq!(restored.width, 2000.0);
    assert_eq!(restored.height, 600.0);
    assert_eq!(restored.x, Some(1500));
    assert_eq!(restored.y, Some(-100));
    assert!(restored.maximized);
}
