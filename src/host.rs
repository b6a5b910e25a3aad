//! # Host Runtime Seam
//!
//! The window core never talks to a GUI toolkit directly. Everything it needs
//! from the native side (window construction, visibility, zoom, the pointer,
//! displays, the system browser, the application menu) goes through the
//! [`HostRuntime`] trait, and everything the native side reports back arrives
//! as a [`WindowEvent`] routed through `WindowManager::dispatch`.
//!
//! The desktop build implements the trait on top of Tauri (`tauri_host`);
//! tests implement it with a recording mock.

use serde::{Deserialize, Serialize};

use crate::errors::WindowResult;
use crate::menu::MenuModel;
use crate::types::{Display, Point, Size, WindowBounds, WindowHandle, WindowKind};

/// Where a window's content comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentSource {
    /// Page bundled with the application, relative to the app root
    App(String),
    /// Remote page loaded by URL
    Remote(String),
}

impl ContentSource {
    pub fn as_str(&self) -> &str {
        match self {
            ContentSource::App(path) => path,
            ContentSource::Remote(url) => url,
        }
    }
}

/// Everything the host needs to construct a native window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub label: String,
    pub kind: WindowKind,
    pub title: String,
    pub size: Size,
    pub min_size: Option<Size>,
    /// Explicit position; `None` lets the host center the window
    pub position: Option<Point>,
    pub maximized: bool,
    pub resizable: bool,
    pub decorations: bool,
    pub transparent: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub visible: bool,
    pub content: ContentSource,
    /// Content bridge injected before any page script runs
    pub bridge_script: Option<String>,
}

impl WindowConfig {
    /// Defaults for a regular decorated window
    pub fn new(label: impl Into<String>, kind: WindowKind, title: impl Into<String>, size: Size) -> Self {
        Self {
            label: label.into(),
            kind,
            title: title.into(),
            size,
            min_size: None,
            position: None,
            maximized: false,
            resizable: true,
            decorations: true,
            transparent: false,
            always_on_top: false,
            skip_taskbar: false,
            visible: true,
            content: ContentSource::App("index.html".to_string()),
            bridge_script: None,
        }
    }
}

/// Why a render process went away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderGoneReason {
    CleanExit,
    AbnormalExit,
    /// Terminated on purpose, e.g. during teardown
    Killed,
    Crashed,
    Oom,
    LaunchFailed,
    IntegrityFailure,
}

/// Native events the core reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// Same-window navigation is about to happen
    WillNavigate { url: String },
    /// Content asked for a new window (`window.open`, `target=_blank`)
    NewWindowRequested { url: String },
    /// The user (or the app) asked the window to close
    CloseRequested,
    /// The native window is gone
    Closed,
    RenderProcessGone { reason: RenderGoneReason },
    LoadFailed { url: String, code: i32, description: String },
    /// First (or subsequent) load finished
    ContentLoaded,
    Unresponsive,
    Responsive,
    Focused(bool),
    CertificateError { url: String },
    Moved(Point),
    Resized(Size),
}

/// Answer to a new-window request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewWindowResponse {
    Allow,
    Deny,
}

/// What the host should do with the event that was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    /// Let the default behaviour proceed
    Continue,
    /// Cancel the default behaviour (navigation, close)
    PreventDefault,
    NewWindow(NewWindowResponse),
    /// Certificate verdict; the core only ever answers `false`
    Certificate { trusted: bool },
}

/// Native operations consumed by the window core.
///
/// Operations on a handle the host no longer knows about must fail with an
/// error rather than panic; the lifecycle layer turns those into warnings.
pub trait HostRuntime {
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<WindowHandle>;
    fn is_destroyed(&self, handle: &WindowHandle) -> bool;
    fn is_visible(&self, handle: &WindowHandle) -> bool;

    fn show(&mut self, handle: &WindowHandle) -> WindowResult<()>;
    fn hide(&mut self, handle: &WindowHandle) -> WindowResult<()>;
    fn focus(&mut self, handle: &WindowHandle) -> WindowResult<()>;
    /// Ask the window to close. Produces `CloseRequested` then `Closed`.
    fn close(&mut self, handle: &WindowHandle) -> WindowResult<()>;

    fn navigate(&mut self, handle: &WindowHandle, source: &ContentSource) -> WindowResult<()>;
    fn reload(&mut self, handle: &WindowHandle) -> WindowResult<()>;

    fn set_always_on_top(&mut self, handle: &WindowHandle, on_top: bool) -> WindowResult<()>;
    fn set_skip_taskbar(&mut self, handle: &WindowHandle, skip: bool) -> WindowResult<()>;
    fn set_zoom_factor(&mut self, handle: &WindowHandle, factor: f64) -> WindowResult<()>;
    fn set_position(&mut self, handle: &WindowHandle, position: Point) -> WindowResult<()>;
    fn bounds(&self, handle: &WindowHandle) -> WindowResult<WindowBounds>;

    fn cursor_position(&self) -> WindowResult<Point>;
    fn displays(&self) -> WindowResult<Vec<Display>>;

    /// Hand a URL to the system's default browser
    fn open_external(&mut self, url: &str) -> WindowResult<()>;
    fn set_application_menu(&mut self, menu: &MenuModel) -> WindowResult<()>;
    /// Deliver a message to the window's content bridge
    fn send_to_content(
        &mut self,
        handle: &WindowHandle,
        channel: &str,
        payload: serde_json::Value,
    ) -> WindowResult<()>;
}
