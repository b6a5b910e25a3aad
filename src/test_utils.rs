//! Test helpers: a recording `HostRuntime` mock and manager factories.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::{WindowError, WindowResult};
use crate::host::{ContentSource, HostRuntime, WindowConfig};
use crate::menu::MenuModel;
use crate::platform::{Os, PlatformPolicy};
use crate::settings::MemorySettingsStore;
use crate::types::{Display, Point, Rect, WindowBounds, WindowHandle};
use crate::window_manager::WindowManager;

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Create(String),
    Show(String),
    Hide(String),
    Focus(String),
    Close(String),
    Navigate(String, ContentSource),
    Reload(String),
    SetAlwaysOnTop(String, bool),
    SetSkipTaskbar(String, bool),
    SetZoom(String, f64),
    SetPosition(String, Point),
    OpenExternal(String),
    SetMenu,
    Send(String, String, Value),
}

#[derive(Debug, Clone)]
pub struct MockWindow {
    pub config: WindowConfig,
    pub visible: bool,
    pub destroyed: bool,
    pub position: Option<Point>,
    pub source: ContentSource,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub zoom_factor: f64,
}

#[derive(Debug)]
pub struct MockHost {
    pub windows: HashMap<String, MockWindow>,
    pub calls: Vec<HostCall>,
    pub cursor: Point,
    pub displays: Vec<Display>,
    pub fail_create: bool,
    /// Windows die right after construction (renderer fails to start)
    pub destroy_on_create: bool,
    pub menus: Vec<MenuModel>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// Two side-by-side monitors: 1920x1080 primary and a 2560x1440 secondary on the right.
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            calls: Vec::new(),
            cursor: Point::new(100.0, 100.0),
            displays: vec![
                Display {
                    bounds: Rect::new(0.0, 0.0, 1920.0, 1080.0),
                    work_area: Rect::new(0.0, 0.0, 1920.0, 1040.0),
                    scale_factor: 1.0,
                },
                Display {
                    bounds: Rect::new(1920.0, 0.0, 2560.0, 1440.0),
                    work_area: Rect::new(1920.0, 25.0, 2560.0, 1415.0),
                    scale_factor: 2.0,
                },
            ],
            fail_create: false,
            destroy_on_create: false,
            menus: Vec::new(),
        }
    }

    pub fn window(&self, label: &str) -> Option<&MockWindow> {
        self.windows.get(label)
    }

    pub fn count<F: Fn(&HostCall) -> bool>(&self, predicate: F) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Simulate the OS tearing a window down without going through the core
    pub fn destroy_externally(&mut self, label: &str) {
        if let Some(window) = self.windows.get_mut(label) {
            window.destroyed = true;
            window.visible = false;
        }
    }

    pub fn live_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .windows
            .iter()
            .filter(|(_, w)| !w.destroyed)
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();
        labels
    }

    fn live_window(&mut self, handle: &WindowHandle) -> WindowResult<&mut MockWindow> {
        match self.windows.get_mut(handle.label()) {
            Some(window) if !window.destroyed => Ok(window),
            _ => Err(WindowError::Host {
                message: format!("window '{}' does not exist", handle),
            }),
        }
    }
}

impl HostRuntime for MockHost {
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<WindowHandle> {
        if self.fail_create {
            return Err(WindowError::Host {
                message: "window creation failed".to_string(),
            });
        }
        if self.windows.get(&config.label).is_some_and(|w| !w.destroyed) {
            return Err(WindowError::Host {
                message: format!("a window with label '{}' already exists", config.label),
            });
        }

        self.calls.push(HostCall::Create(config.label.clone()));
        self.windows.insert(
            config.label.clone(),
            MockWindow {
                config: config.clone(),
                visible: config.visible,
                destroyed: self.destroy_on_create,
                position: config.position,
                source: config.content.clone(),
                always_on_top: config.always_on_top,
                skip_taskbar: config.skip_taskbar,
                zoom_factor: 1.0,
            },
        );
        Ok(WindowHandle::new(config.label.clone()))
    }

    fn is_destroyed(&self, handle: &WindowHandle) -> bool {
        self.windows.get(handle.label()).map(|w| w.destroyed).unwrap_or(true)
    }

    fn is_visible(&self, handle: &WindowHandle) -> bool {
        self.windows
            .get(handle.label())
            .map(|w| w.visible && !w.destroyed)
            .unwrap_or(false)
    }

    fn show(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        self.live_window(handle)?.visible = true;
        self.calls.push(HostCall::Show(handle.label().to_string()));
        Ok(())
    }

    fn hide(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        self.live_window(handle)?.visible = false;
        self.calls.push(HostCall::Hide(handle.label().to_string()));
        Ok(())
    }

    fn focus(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        self.live_window(handle)?;
        self.calls.push(HostCall::Focus(handle.label().to_string()));
        Ok(())
    }

    fn close(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        let window = self.live_window(handle)?;
        window.destroyed = true;
        window.visible = false;
        self.calls.push(HostCall::Close(handle.label().to_string()));
        Ok(())
    }

    fn navigate(&mut self, handle: &WindowHandle, source: &ContentSource) -> WindowResult<()> {
        self.live_window(handle)?.source = source.clone();
        self.calls
            .push(HostCall::Navigate(handle.label().to_string(), source.clone()));
        Ok(())
    }

    fn reload(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        self.live_window(handle)?;
        self.calls.push(HostCall::Reload(handle.label().to_string()));
        Ok(())
    }

    fn set_always_on_top(&mut self, handle: &WindowHandle, on_top: bool) -> WindowResult<()> {
        self.live_window(handle)?.always_on_top = on_top;
        self.calls
            .push(HostCall::SetAlwaysOnTop(handle.label().to_string(), on_top));
        Ok(())
    }

    fn set_skip_taskbar(&mut self, handle: &WindowHandle, skip: bool) -> WindowResult<()> {
        self.live_window(handle)?.skip_taskbar = skip;
        self.calls
            .push(HostCall::SetSkipTaskbar(handle.label().to_string(), skip));
        Ok(())
    }

    fn set_zoom_factor(&mut self, handle: &WindowHandle, factor: f64) -> WindowResult<()> {
        self.live_window(handle)?.zoom_factor = factor;
        self.calls.push(HostCall::SetZoom(handle.label().to_string(), factor));
        Ok(())
    }

    fn set_position(&mut self, handle: &WindowHandle, position: Point) -> WindowResult<()> {
        self.live_window(handle)?.position = Some(position);
        self.calls
            .push(HostCall::SetPosition(handle.label().to_string(), position));
        Ok(())
    }

    fn bounds(&self, handle: &WindowHandle) -> WindowResult<WindowBounds> {
        let window = self
            .windows
            .get(handle.label())
            .filter(|w| !w.destroyed)
            .ok_or_else(|| WindowError::Host {
                message: format!("window '{}' does not exist", handle),
            })?;
        Ok(WindowBounds {
            width: window.config.size.width,
            height: window.config.size.height,
            x: window.position.map(|p| p.x as i32),
            y: window.position.map(|p| p.y as i32),
            maximized: window.config.maximized,
        })
    }

    fn cursor_position(&self) -> WindowResult<Point> {
        Ok(self.cursor)
    }

    fn displays(&self) -> WindowResult<Vec<Display>> {
        Ok(self.displays.clone())
    }

    fn open_external(&mut self, url: &str) -> WindowResult<()> {
        self.calls.push(HostCall::OpenExternal(url.to_string()));
        Ok(())
    }

    fn set_application_menu(&mut self, menu: &MenuModel) -> WindowResult<()> {
        self.menus.push(menu.clone());
        self.calls.push(HostCall::SetMenu);
        Ok(())
    }

    fn send_to_content(
        &mut self,
        handle: &WindowHandle,
        channel: &str,
        payload: Value,
    ) -> WindowResult<()> {
        self.live_window(handle)?;
        self.calls.push(HostCall::Send(
            handle.label().to_string(),
            channel.to_string(),
            payload,
        ));
        Ok(())
    }
}

/// Manager on a Linux-shaped platform with in-memory settings
pub fn test_manager() -> WindowManager<MockHost> {
    manager_for(Os::Linux)
}

pub fn manager_for(os: Os) -> WindowManager<MockHost> {
    WindowManager::new(
        MockHost::new(),
        Box::new(MemorySettingsStore::new()),
        PlatformPolicy::for_os(os),
    )
}
