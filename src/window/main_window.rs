//! # Main Window
//!
//! The primary content window. Besides hosting the web application it is the
//! enforcement point for the navigation policy and owns three small state
//! machines:
//!
//! ### Navigation
//! - Same-window navigation to `External` or `Invalid` targets is cancelled and logged.
//! - New-window requests are classified and turned into a [`PopupDecision`]; the
//!   `WindowManager` performs the resulting side effect (auth window, system browser).
//!
//! ### Close-to-tray
//! - `Visible` → `HiddenToTray` on a user close unless the app is quitting.
//! - Non-macOS platforms also drop the taskbar entry while hidden.
//! - `restore_from_tray` reverses both.
//!
//! ### Crash recovery
//! - Render process gone for any reason other than `Killed` → reload.
//! - Load failures and unresponsive renderers are logged only.

use serde_json::Value;

use crate::constants::{
    GEMINI_URL, MAIN_WINDOW_LABEL, MAIN_WINDOW_MIN_SIZE, MAIN_WINDOW_TITLE,
};
use crate::errors::WindowResult;
use crate::host::{ContentSource, EventResponse, HostRuntime, RenderGoneReason, WindowConfig};
use crate::navigation::{DomainClassification, DomainPolicy, NavigationDecision, PopupDecision};
use crate::platform::PlatformPolicy;
use crate::types::{Point, Size, WindowBounds, WindowHandle, WindowKind, ZoomLevel};
use crate::window::lifecycle::{WindowContent, WindowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayState {
    Visible,
    HiddenToTray,
}

/// What to build the main window with; updated as settings change
#[derive(Debug, Clone)]
struct MainContent {
    bounds: WindowBounds,
    always_on_top: bool,
}

impl WindowContent for MainContent {
    fn kind(&self) -> WindowKind {
        WindowKind::Main
    }

    fn config(&self) -> WindowConfig {
        let bounds = self.bounds.validated();
        let mut config = WindowConfig::new(
            MAIN_WINDOW_LABEL,
            WindowKind::Main,
            MAIN_WINDOW_TITLE,
            Size::new(bounds.width, bounds.height),
        );
        config.min_size = Some(Size::new(MAIN_WINDOW_MIN_SIZE.0, MAIN_WINDOW_MIN_SIZE.1));
        if let (Some(x), Some(y)) = (bounds.x, bounds.y) {
            config.position = Some(Point::new(f64::from(x), f64::from(y)));
        }
        config.maximized = bounds.maximized;
        config.always_on_top = self.always_on_top;
        config
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::Remote(GEMINI_URL.to_string())
    }
}

#[derive(Debug)]
pub struct MainWindow {
    record: WindowRecord,
    content: MainContent,
    policy: DomainPolicy,
    platform: PlatformPolicy,
    quitting: bool,
    tray_state: TrayState,
    crash_reloads: u32,
}

impl MainWindow {
    pub fn new(policy: DomainPolicy, platform: PlatformPolicy, bounds: WindowBounds, always_on_top: bool) -> Self {
        Self {
            record: WindowRecord::new(WindowKind::Main),
            content: MainContent {
                bounds,
                always_on_top,
            },
            policy,
            platform,
            quitting: false,
            tray_state: TrayState::Visible,
            crash_reloads: 0,
        }
    }

    pub fn create(&mut self, host: &mut dyn HostRuntime) -> WindowResult<WindowHandle> {
        let reused = self.record.live_handle(&*host).is_some();
        let handle = self.record.create(host, &mut self.content)?;
        // A reused window keeps whatever tray state it is in
        if !reused {
            self.tray_state = TrayState::Visible;
        }
        Ok(handle)
    }

    pub fn record(&self) -> &WindowRecord {
        &self.record
    }

    pub fn owns(&self, handle: &WindowHandle) -> bool {
        self.record.owns(handle)
    }

    pub fn live_handle(&mut self, host: &dyn HostRuntime) -> Option<WindowHandle> {
        self.record.live_handle(host)
    }

    pub fn is_visible(&mut self, host: &dyn HostRuntime) -> bool {
        self.record.is_visible(host)
    }

    pub fn tray_state(&self) -> TrayState {
        self.tray_state
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Only the application's quit path should call this with `true`.
    pub fn set_quitting(&mut self, quitting: bool) {
        self.quitting = quitting;
    }

    pub fn crash_reloads(&self) -> u32 {
        self.crash_reloads
    }

    pub fn handle_will_navigate(&self, url: &str) -> EventResponse {
        match self.policy.navigation_decision(url) {
            NavigationDecision::Allow => EventResponse::Continue,
            NavigationDecision::Cancel => {
                log::warn!("🚫 Blocked main window navigation to untrusted URL: {}", url);
                EventResponse::PreventDefault
            }
        }
    }

    pub fn handle_new_window(&self, url: &str) -> PopupDecision {
        let decision = self.policy.popup_decision(url);
        match &decision {
            PopupDecision::Allow => log::debug!("🪟 Allowing first-party popup: {}", url),
            PopupDecision::Deny => match self.policy.classify(url) {
                DomainClassification::Invalid => log::debug!("Ignoring popup request: {}", url),
                _ => log::warn!("🚫 Dropped popup request for non-web target: {}", url),
            },
            PopupDecision::OpenInAuthWindow(_) => {
                log::info!("🔐 Redirecting sign-in popup into auth window: {}", url)
            }
            PopupDecision::OpenExternally(_) => {
                log::info!("🌐 Handing popup to system browser: {}", url)
            }
        }
        decision
    }

    /// User asked to close. Returns the response and whether the window went to the tray.
    pub fn handle_close_requested(&mut self, host: &mut dyn HostRuntime) -> (EventResponse, bool) {
        if self.quitting || !self.platform.close_to_tray {
            return (EventResponse::Continue, false);
        }
        let hidden = self.hide_to_tray(host);
        (EventResponse::PreventDefault, hidden)
    }

    /// Hide into the tray. Returns `true` only on an actual `Visible` → `HiddenToTray` transition.
    pub fn hide_to_tray(&mut self, host: &mut dyn HostRuntime) -> bool {
        if self.tray_state == TrayState::HiddenToTray && !self.record.is_visible(&*host) {
            log::debug!("Main window already hidden to tray");
            return false;
        }
        if !self.record.hide(host) {
            return false;
        }
        if self.platform.skip_taskbar_when_hidden {
            self.record
                .run_on_live(host, "skip taskbar", |host, handle| host.set_skip_taskbar(handle, true));
        }
        self.tray_state = TrayState::HiddenToTray;
        log::info!("📥 Main window hidden to tray");
        true
    }

    /// Bring the window back (rebuilding it if it is gone) and focus it
    pub fn restore_from_tray(&mut self, host: &mut dyn HostRuntime) -> WindowResult<WindowHandle> {
        let handle = self.create(host)?;
        self.record.show(host);
        if self.platform.skip_taskbar_when_hidden {
            self.record
                .run_on_live(host, "restore taskbar", |host, handle| host.set_skip_taskbar(handle, false));
        }
        self.record.focus(host);
        self.tray_state = TrayState::Visible;
        Ok(handle)
    }

    /// Returns `true` when a reload was issued
    pub fn handle_render_process_gone(&mut self, host: &mut dyn HostRuntime, reason: RenderGoneReason) -> bool {
        if reason == RenderGoneReason::Killed {
            log::info!("Main window renderer was killed, not reloading");
            return false;
        }

        log::error!("💥 Main window renderer gone ({:?}), reloading", reason);
        let reloaded = self
            .record
            .run_on_live(host, "reload", |host, handle| host.reload(handle));
        if reloaded {
            self.crash_reloads += 1;
        }
        reloaded
    }

    pub fn handle_load_failed(&self, url: &str, code: i32, description: &str) {
        log::warn!(
            "⚠️ Main window failed to load {} ({}: {}), waiting for user retry",
            url,
            code,
            description
        );
    }

    pub fn handle_unresponsive(&self) {
        log::warn!("⏳ Main window became unresponsive");
    }

    pub fn handle_responsive(&self) {
        log::info!("✅ Main window is responsive again");
    }

    pub fn handle_closed(&mut self, handle: &WindowHandle) -> bool {
        let closed = self.record.handle_closed(handle);
        if closed {
            self.tray_state = TrayState::Visible;
        }
        closed
    }

    /// Current geometry to persist after a move or resize
    pub fn current_bounds(&mut self, host: &dyn HostRuntime) -> Option<WindowBounds> {
        let handle = self.record.live_handle(host)?;
        match host.bounds(&handle) {
            Ok(bounds) => {
                self.content.bounds = bounds.clone();
                Some(bounds)
            }
            Err(e) => {
                log::warn!("⚠️ Could not read main window bounds: {}", e);
                None
            }
        }
    }

    pub fn apply_zoom(&mut self, host: &mut dyn HostRuntime, level: ZoomLevel) -> bool {
        self.record
            .run_on_live(host, "set zoom", |host, handle| host.set_zoom_factor(handle, level.factor()))
    }

    pub fn apply_always_on_top(&mut self, host: &mut dyn HostRuntime, on_top: bool) -> bool {
        self.content.always_on_top = on_top;
        self.record
            .run_on_live(host, "set always on top", |host, handle| host.set_always_on_top(handle, on_top))
    }

    pub fn reload(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.record.run_on_live(host, "reload", |host, handle| host.reload(handle))
    }

    pub fn close(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.record.close(host)
    }

    pub fn send_to_content(&mut self, host: &mut dyn HostRuntime, channel: &str, payload: Value) -> bool {
        self.record.run_on_live(host, "send to content", |host, handle| {
            host.send_to_content(handle, channel, payload)
        })
    }
}
