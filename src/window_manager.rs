//! # Window Manager
//!
//! Owns one instance of every window kind and is the single entry point for
//! the host runtime, the menu, the tray, hotkeys and frontend commands.
//!
//! ## Responsibilities
//!
//! - **Event routing**: every native [`WindowEvent`] goes through [`WindowManager::dispatch`],
//!   which finds the owning window and returns the [`EventResponse`] for the host.
//! - **Cross-window effects**: hiding the main window to the tray closes the
//!   auth and options windows; main window popups can open the auth window or
//!   the system browser.
//! - **Aggregate state**: zoom level and always-on-top are owned here, applied
//!   to the main window, persisted, and announced on the [`EventBus`].
//! - **Quit path**: `request_quit` is the only place the main window is allowed
//!   to close for real while a tray is available.
//!
//! Everything runs on the host's event loop. Windows never hold references to
//! each other; they return decisions and the manager applies them.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;

use crate::constants::{QUICK_CHAT_SUBMIT_CHANNEL, SIGN_IN_URL};
use crate::errors::WindowResult;
use crate::events::{EventBus, ManagerEvent};
use crate::host::{EventResponse, HostRuntime, NewWindowResponse, WindowEvent};
use crate::hotkeys::{HotkeyId, HotkeyProvider, HotkeyRegistry};
use crate::menu::{build_application_menu, MenuAction, MenuModel};
use crate::navigation::{default_policy, DomainPolicy, NavigationDecision, PopupDecision};
use crate::platform::PlatformPolicy;
use crate::settings::{
    write_setting, AppSettings, SettingsStore, ALWAYS_ON_TOP_KEY, WINDOW_BOUNDS_KEY, ZOOM_LEVEL_KEY,
};
use crate::types::{OptionsTab, WindowHandle, WindowKind, ZoomLevel};
use crate::window::{AuthWindow, MainWindow, OptionsWindow, QuickChatWindow, TrayState};

/// Items of the system tray menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrayAction {
    Show,
    Hide,
    Quit,
}

impl TrayAction {
    pub fn id(&self) -> &'static str {
        match self {
            TrayAction::Show => "tray-show",
            TrayAction::Hide => "tray-hide",
            TrayAction::Quit => "tray-quit",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [TrayAction::Show, TrayAction::Hide, TrayAction::Quit]
            .into_iter()
            .find(|action| action.id() == id)
    }
}

pub struct WindowManager<H: HostRuntime> {
    host: H,
    settings: Box<dyn SettingsStore + Send>,
    platform: PlatformPolicy,
    policy: DomainPolicy,
    bus: EventBus,
    hotkeys: HotkeyRegistry,
    zoom: ZoomLevel,
    always_on_top: bool,
    main: MainWindow,
    auth: AuthWindow,
    options: OptionsWindow,
    quick_chat: QuickChatWindow,
}

impl<H: HostRuntime> WindowManager<H> {
    /// Read persisted settings once and set up the (not yet created) windows
    pub fn new(host: H, settings: Box<dyn SettingsStore + Send>, platform: PlatformPolicy) -> Self {
        let restored = AppSettings::load(&*settings);
        let policy = default_policy().clone();
        log::info!(
            "🚀 Window manager ready ({:?}, zoom {}, always on top: {})",
            platform.os,
            restored.zoom_level,
            restored.always_on_top
        );

        Self {
            main: MainWindow::new(
                policy.clone(),
                platform.clone(),
                restored.window_bounds,
                restored.always_on_top,
            ),
            auth: AuthWindow::new(policy.clone()),
            options: OptionsWindow::new(),
            quick_chat: QuickChatWindow::new(),
            host,
            settings,
            platform,
            policy,
            bus: EventBus::new(),
            hotkeys: HotkeyRegistry::new(),
            zoom: restored.zoom_level,
            always_on_top: restored.always_on_top,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        &*self.settings
    }

    pub fn platform(&self) -> &PlatformPolicy {
        &self.platform
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.bus.subscribe()
    }

    pub fn hotkeys(&self) -> &HotkeyRegistry {
        &self.hotkeys
    }

    /// Which window kind owns `handle`, if any
    pub fn kind_of(&self, handle: &WindowHandle) -> Option<WindowKind> {
        if self.main.owns(handle) {
            Some(WindowKind::Main)
        } else if self.auth.owns(handle) {
            Some(WindowKind::Auth)
        } else if self.options.owns(handle) {
            Some(WindowKind::Options)
        } else if self.quick_chat.owns(handle) {
            Some(WindowKind::QuickChat)
        } else {
            None
        }
    }

    // ===== Main window =====

    /// Create (or focus) the main window and apply the persisted zoom
    pub fn create_main_window(&mut self) -> WindowResult<WindowHandle> {
        let handle = self.main.create(&mut self.host)?;
        self.main.apply_zoom(&mut self.host, self.zoom);
        Ok(handle)
    }

    pub fn is_main_visible(&mut self) -> bool {
        self.main.is_visible(&self.host)
    }

    pub fn main_tray_state(&self) -> TrayState {
        self.main.tray_state()
    }

    pub fn is_quitting(&self) -> bool {
        self.main.is_quitting()
    }

    /// Hide the main window to the tray. Auxiliary windows close on the first transition only.
    pub fn hide_main_to_tray(&mut self) -> bool {
        if !self.main.hide_to_tray(&mut self.host) {
            return false;
        }
        self.close_auxiliary_windows();
        true
    }

    pub fn restore_main_window(&mut self) -> WindowResult<WindowHandle> {
        let handle = self.main.restore_from_tray(&mut self.host)?;
        self.main.apply_zoom(&mut self.host, self.zoom);
        Ok(handle)
    }

    pub fn toggle_main_visibility(&mut self) -> WindowResult<()> {
        if self.main.is_visible(&self.host) {
            self.hide_main_to_tray();
        } else {
            self.restore_main_window()?;
        }
        Ok(())
    }

    pub fn reload_main_window(&mut self) -> bool {
        self.main.reload(&mut self.host)
    }

    // ===== Auxiliary windows =====

    pub fn open_auth_window(&mut self, url: &str) -> WindowResult<WindowHandle> {
        self.auth.create(&mut self.host, url)
    }

    pub fn open_sign_in(&mut self) -> WindowResult<WindowHandle> {
        self.open_auth_window(SIGN_IN_URL)
    }

    pub fn open_options(&mut self, tab: OptionsTab) -> WindowResult<WindowHandle> {
        self.options.create(&mut self.host, tab)
    }

    /// Returns the quick chat visibility after the toggle
    pub fn toggle_quick_chat(&mut self) -> WindowResult<bool> {
        self.quick_chat.toggle(&mut self.host)
    }

    pub fn hide_quick_chat(&mut self) -> bool {
        self.quick_chat.hide(&mut self.host)
    }

    pub fn is_quick_chat_ready(&self) -> bool {
        self.quick_chat.is_ready()
    }

    /// Forward quick chat text to the main window. Blank text is ignored.
    pub fn submit_quick_chat(&mut self, text: &str) -> WindowResult<bool> {
        let text = text.trim();
        if text.is_empty() {
            log::debug!("Ignoring empty quick chat submission");
            return Ok(false);
        }

        self.quick_chat.hide(&mut self.host);
        self.restore_main_window()?;
        let sent = self.main.send_to_content(
            &mut self.host,
            QUICK_CHAT_SUBMIT_CHANNEL,
            json!({ "text": text }),
        );
        if sent {
            log::info!("💬 Quick chat text forwarded to main window");
        }
        Ok(sent)
    }

    fn close_auxiliary_windows(&mut self) {
        if self.auth.live_handle(&self.host).is_some() {
            self.auth.close(&mut self.host);
        }
        if self.options.live_handle(&self.host).is_some() {
            self.options.close(&mut self.host);
        }
    }

    fn close_quick_chat(&mut self) {
        if self.quick_chat.live_handle(&self.host).is_some() {
            self.quick_chat.close(&mut self.host);
        }
    }

    // ===== Zoom =====

    pub fn zoom_level(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> ZoomLevel {
        self.apply_zoom_level(self.zoom.step_in())
    }

    pub fn zoom_out(&mut self) -> ZoomLevel {
        self.apply_zoom_level(self.zoom.step_out())
    }

    pub fn reset_zoom(&mut self) -> ZoomLevel {
        self.apply_zoom_level(ZoomLevel::default())
    }

    /// Clamp to the supported range and snap to the nearest step
    pub fn set_zoom_level(&mut self, percent: u32) -> ZoomLevel {
        self.apply_zoom_level(ZoomLevel::new(percent))
    }

    fn apply_zoom_level(&mut self, level: ZoomLevel) -> ZoomLevel {
        if level == self.zoom {
            return level;
        }

        log::info!("🔍 Zoom {} → {}", self.zoom, level);
        self.zoom = level;
        if self.main.live_handle(&self.host).is_some() {
            self.main.apply_zoom(&mut self.host, level);
        }
        self.persist(ZOOM_LEVEL_KEY, &level.percent());
        self.bus.publish(ManagerEvent::ZoomLevelChanged { level });
        level
    }

    // ===== Always on top =====

    pub fn is_always_on_top(&self) -> bool {
        self.always_on_top
    }

    /// Returns `true` when the value changed
    pub fn set_always_on_top(&mut self, enabled: bool) -> bool {
        if enabled == self.always_on_top {
            return false;
        }

        log::info!("📌 Always on top: {}", enabled);
        self.always_on_top = enabled;
        self.main.apply_always_on_top(&mut self.host, enabled);
        self.persist(ALWAYS_ON_TOP_KEY, &enabled);
        self.bus.publish(ManagerEvent::AlwaysOnTopChanged { enabled });
        true
    }

    pub fn toggle_always_on_top(&mut self) -> bool {
        let enabled = !self.always_on_top;
        self.set_always_on_top(enabled);
        enabled
    }

    // ===== Hotkeys =====

    pub fn set_hotkey_accelerator(&mut self, id: HotkeyId, accelerator: &str) -> WindowResult<()> {
        if self.hotkeys.set_accelerator(id, accelerator)? {
            self.notify_accelerator_changed(id);
        }
        Ok(())
    }

    pub fn set_hotkey_enabled(&mut self, id: HotkeyId, enabled: bool) -> WindowResult<()> {
        if self.hotkeys.set_individual_enabled(id, enabled)? {
            self.notify_hotkey_enabled_changed(id);
        }
        Ok(())
    }

    pub fn notify_accelerator_changed(&self, id: HotkeyId) {
        self.bus.publish(ManagerEvent::AcceleratorChanged {
            id,
            accelerator: self.hotkeys.accelerator(id),
        });
    }

    pub fn notify_hotkey_enabled_changed(&self, id: HotkeyId) {
        self.bus.publish(ManagerEvent::HotkeyEnabledChanged {
            id,
            enabled: self.hotkeys.is_individual_enabled(id),
        });
    }

    /// A registered hotkey fired
    pub fn handle_hotkey(&mut self, id: HotkeyId) -> WindowResult<()> {
        if !self.hotkeys.is_individual_enabled(id) {
            log::debug!("Hotkey '{}' is disabled, ignoring", id);
            return Ok(());
        }

        match id {
            HotkeyId::AlwaysOnTop => {
                self.toggle_always_on_top();
            }
            HotkeyId::PeekAndHide => self.toggle_main_visibility()?,
            HotkeyId::QuickChat => {
                self.toggle_quick_chat()?;
            }
            HotkeyId::Zoom => {}
        }
        Ok(())
    }

    // ===== Menu, tray, quit =====

    /// Current application menu
    pub fn application_menu(&self) -> MenuModel {
        build_application_menu(&self.platform, self.zoom, self.always_on_top, &self.hotkeys)
    }

    /// Rebuild the application menu and install it on the host
    pub fn refresh_menu(&mut self) -> WindowResult<()> {
        let menu = self.application_menu();
        self.host.set_application_menu(&menu)
    }

    pub fn handle_menu_action(&mut self, action: MenuAction) -> WindowResult<()> {
        log::debug!("Menu action: {:?}", action);
        match action {
            MenuAction::OpenSettings => {
                self.open_options(OptionsTab::Settings)?;
            }
            MenuAction::OpenAbout => {
                self.open_options(OptionsTab::About)?;
            }
            MenuAction::SignIn => {
                self.open_sign_in()?;
            }
            MenuAction::Reload => {
                self.reload_main_window();
            }
            MenuAction::ZoomIn => {
                self.zoom_in();
            }
            MenuAction::ZoomOut => {
                self.zoom_out();
            }
            MenuAction::ResetZoom => {
                self.reset_zoom();
            }
            MenuAction::ToggleAlwaysOnTop => {
                self.toggle_always_on_top();
            }
            MenuAction::ToggleQuickChat => {
                self.toggle_quick_chat()?;
            }
            MenuAction::HideToTray => {
                self.hide_main_to_tray();
            }
            MenuAction::Quit => self.request_quit(),
        }
        Ok(())
    }

    pub fn handle_tray_action(&mut self, action: TrayAction) -> WindowResult<()> {
        match action {
            TrayAction::Show => {
                self.restore_main_window()?;
            }
            TrayAction::Hide => {
                self.hide_main_to_tray();
            }
            TrayAction::Quit => self.request_quit(),
        }
        Ok(())
    }

    /// Let the main window close for real and take every other window with it
    pub fn request_quit(&mut self) {
        log::info!("👋 Quit requested");
        self.main.set_quitting(true);
        self.close_auxiliary_windows();
        self.close_quick_chat();
        if self.main.live_handle(&self.host).is_some() {
            self.main.close(&mut self.host);
        }
    }

    // ===== Event routing =====

    /// Route a native event to the window that owns `handle`
    pub fn dispatch(&mut self, handle: &WindowHandle, event: WindowEvent) -> EventResponse {
        match self.kind_of(handle) {
            Some(WindowKind::Main) => self.dispatch_main(handle, event),
            Some(WindowKind::Auth) => self.dispatch_auth(handle, event),
            Some(WindowKind::Options) => self.dispatch_options(handle, event),
            Some(WindowKind::QuickChat) => self.dispatch_quick_chat(handle, event),
            None => self.dispatch_unknown(handle, event),
        }
    }

    fn dispatch_main(&mut self, handle: &WindowHandle, event: WindowEvent) -> EventResponse {
        match event {
            WindowEvent::WillNavigate { url } => self.main.handle_will_navigate(&url),
            WindowEvent::NewWindowRequested { url } => {
                let decision = self.main.handle_new_window(&url);
                self.apply_popup_decision(decision)
            }
            WindowEvent::CloseRequested => {
                let (response, hidden) = self.main.handle_close_requested(&mut self.host);
                if hidden || response == EventResponse::Continue {
                    self.close_auxiliary_windows();
                }
                // Nothing is left to bring a hidden quick chat back once main is gone
                if response == EventResponse::Continue {
                    self.close_quick_chat();
                }
                response
            }
            WindowEvent::Closed => {
                self.main.handle_closed(handle);
                EventResponse::Continue
            }
            WindowEvent::RenderProcessGone { reason } => {
                if self.main.handle_render_process_gone(&mut self.host, reason) {
                    self.main.apply_zoom(&mut self.host, self.zoom);
                }
                EventResponse::Continue
            }
            WindowEvent::LoadFailed { url, code, description } => {
                self.main.handle_load_failed(&url, code, &description);
                EventResponse::Continue
            }
            WindowEvent::Unresponsive => {
                self.main.handle_unresponsive();
                EventResponse::Continue
            }
            WindowEvent::Responsive => {
                self.main.handle_responsive();
                EventResponse::Continue
            }
            WindowEvent::CertificateError { url } => {
                log::warn!("🔒 Rejecting certificate error in main window for {}", url);
                EventResponse::Certificate { trusted: false }
            }
            WindowEvent::Moved(_) | WindowEvent::Resized(_) => {
                if let Some(bounds) = self.main.current_bounds(&self.host) {
                    self.persist(WINDOW_BOUNDS_KEY, &bounds);
                }
                EventResponse::Continue
            }
            WindowEvent::ContentLoaded | WindowEvent::Focused(_) => EventResponse::Continue,
        }
    }

    fn dispatch_auth(&mut self, handle: &WindowHandle, event: WindowEvent) -> EventResponse {
        match event {
            WindowEvent::WillNavigate { url } => self.auth.handle_will_navigate(&mut self.host, &url),
            WindowEvent::NewWindowRequested { url } => self.external_only_popup(&url),
            WindowEvent::CertificateError { url } => self.auth.handle_certificate_error(&url),
            WindowEvent::LoadFailed { url, code, description } => {
                self.auth.handle_load_failed(&url, code, &description);
                EventResponse::Continue
            }
            WindowEvent::Closed => {
                self.auth.handle_closed(handle);
                EventResponse::Continue
            }
            _ => EventResponse::Continue,
        }
    }

    fn dispatch_options(&mut self, handle: &WindowHandle, event: WindowEvent) -> EventResponse {
        match event {
            WindowEvent::WillNavigate { url } => self.navigation_response(&url),
            WindowEvent::NewWindowRequested { url } => self.external_only_popup(&url),
            WindowEvent::CertificateError { .. } => EventResponse::Certificate { trusted: false },
            WindowEvent::Closed => {
                self.options.handle_closed(handle);
                EventResponse::Continue
            }
            _ => EventResponse::Continue,
        }
    }

    fn dispatch_quick_chat(&mut self, handle: &WindowHandle, event: WindowEvent) -> EventResponse {
        match event {
            WindowEvent::WillNavigate { url } => self.navigation_response(&url),
            WindowEvent::NewWindowRequested { url } => self.external_only_popup(&url),
            WindowEvent::CertificateError { .. } => EventResponse::Certificate { trusted: false },
            WindowEvent::Focused(focused) => {
                self.quick_chat.handle_focus_changed(&mut self.host, focused);
                EventResponse::Continue
            }
            WindowEvent::ContentLoaded => {
                self.quick_chat.handle_content_loaded();
                EventResponse::Continue
            }
            WindowEvent::Closed => {
                self.quick_chat.handle_closed(handle);
                EventResponse::Continue
            }
            _ => EventResponse::Continue,
        }
    }

    /// Windows the core does not track, e.g. first-party popups the main window allowed
    fn dispatch_unknown(&mut self, handle: &WindowHandle, event: WindowEvent) -> EventResponse {
        match event {
            WindowEvent::WillNavigate { url } => self.navigation_response(&url),
            WindowEvent::NewWindowRequested { url } => {
                log::warn!("🚫 Denying popup {} from untracked window '{}'", url, handle);
                EventResponse::NewWindow(NewWindowResponse::Deny)
            }
            WindowEvent::CertificateError { url } => {
                log::warn!("🔒 Rejecting certificate error in untracked window '{}' for {}", handle, url);
                EventResponse::Certificate { trusted: false }
            }
            _ => {
                log::debug!("Event for untracked window '{}': {:?}", handle, event);
                EventResponse::Continue
            }
        }
    }

    fn navigation_response(&self, url: &str) -> EventResponse {
        match self.policy.navigation_decision(url) {
            NavigationDecision::Allow => EventResponse::Continue,
            NavigationDecision::Cancel => {
                log::warn!("🚫 Blocked navigation to untrusted URL: {}", url);
                EventResponse::PreventDefault
            }
        }
    }

    fn apply_popup_decision(&mut self, decision: PopupDecision) -> EventResponse {
        match decision {
            PopupDecision::Allow => EventResponse::NewWindow(NewWindowResponse::Allow),
            PopupDecision::Deny => EventResponse::NewWindow(NewWindowResponse::Deny),
            PopupDecision::OpenInAuthWindow(url) => {
                if let Err(e) = self.open_auth_window(&url) {
                    log::error!("❌ Failed to open auth window for {}: {}", url, e);
                }
                EventResponse::NewWindow(NewWindowResponse::Deny)
            }
            PopupDecision::OpenExternally(url) => {
                self.open_externally(&url);
                EventResponse::NewWindow(NewWindowResponse::Deny)
            }
        }
    }

    /// Auxiliary windows never spawn windows; http(s) links go to the system browser
    fn external_only_popup(&mut self, url: &str) -> EventResponse {
        match self.policy.popup_decision(url) {
            PopupDecision::OpenExternally(url) => self.open_externally(&url),
            _ => log::warn!("🚫 Denying popup from auxiliary window: {}", url),
        }
        EventResponse::NewWindow(NewWindowResponse::Deny)
    }

    fn open_externally(&mut self, url: &str) {
        if let Err(e) = self.host.open_external(url) {
            log::error!("❌ Failed to open {} in the system browser: {}", url, e);
        }
    }

    fn persist<T: Serialize>(&mut self, key: &str, value: &T) {
        if let Err(e) = write_setting(&mut *self.settings, key, value) {
            log::warn!("⚠️ Failed to persist setting '{}': {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAIN_WINDOW_LABEL, OPTIONS_WINDOW_LABEL, QUICK_CHAT_WINDOW_LABEL};
    use crate::host::{ContentSource, RenderGoneReason};
    use crate::hotkeys::ShortcutSynchronizer;
    use crate::platform::Os;
    use crate::settings::{read_setting, MemorySettingsStore};
    use crate::test_utils::{manager_for, test_manager, HostCall, MockHost};
    use crate::types::{Point, Size, WindowBounds};

    fn main_handle() -> WindowHandle {
        WindowHandle::new(MAIN_WINDOW_LABEL)
    }

    fn auth_labels(manager: &WindowManager<MockHost>) -> Vec<String> {
        manager
            .host()
            .live_labels()
            .into_iter()
            .filter(|l| l.starts_with("auth-"))
            .collect()
    }

    fn drain(rx: &mut broadcast::Receiver<ManagerEvent>) -> Vec<ManagerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_startup_restores_persisted_settings() {
        let mut store = MemorySettingsStore::new();
        store.set(ZOOM_LEVEL_KEY, json!(125)).unwrap();
        store.set(ALWAYS_ON_TOP_KEY, json!(true)).unwrap();
        let mut manager = WindowManager::new(
            MockHost::new(),
            Box::new(store),
            PlatformPolicy::for_os(Os::Linux),
        );

        manager.create_main_window().unwrap();
        let main = manager.host().window(MAIN_WINDOW_LABEL).unwrap();
        assert_eq!(main.zoom_factor, 1.25);
        assert!(main.always_on_top);
        assert_eq!(manager.zoom_level(), ZoomLevel::new(125));
    }

    #[test]
    fn test_untrusted_navigation_is_cancelled_once() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();

        let response = manager.dispatch(
            &main_handle(),
            WindowEvent::WillNavigate { url: "https://malicious-site.com".to_string() },
        );
        assert_eq!(response, EventResponse::PreventDefault);

        let response = manager.dispatch(
            &main_handle(),
            WindowEvent::WillNavigate { url: "file:///app/index.html".to_string() },
        );
        assert_eq!(response, EventResponse::Continue);
    }

    #[test]
    fn test_identity_popup_opens_auth_window_exactly_once() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();

        let response = manager.dispatch(
            &main_handle(),
            WindowEvent::NewWindowRequested { url: "https://accounts.google.com/oauth".to_string() },
        );

        assert_eq!(response, EventResponse::NewWindow(NewWindowResponse::Deny));
        let labels = auth_labels(&manager);
        assert_eq!(labels.len(), 1);
        assert_eq!(
            manager.host().window(&labels[0]).unwrap().source,
            ContentSource::Remote("https://accounts.google.com/oauth".to_string())
        );
        assert_eq!(manager.host().count(|c| matches!(c, HostCall::OpenExternal(_))), 0);
    }

    #[test]
    fn test_internal_popup_is_allowed_without_side_effects() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        let calls_before = manager.host().calls.len();

        let response = manager.dispatch(
            &main_handle(),
            WindowEvent::NewWindowRequested { url: "https://gemini.google.com/share/abc".to_string() },
        );

        assert_eq!(response, EventResponse::NewWindow(NewWindowResponse::Allow));
        assert_eq!(manager.host().calls.len(), calls_before);
    }

    #[test]
    fn test_external_popup_goes_to_system_browser() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();

        let response = manager.dispatch(
            &main_handle(),
            WindowEvent::NewWindowRequested { url: "https://example.com".to_string() },
        );

        assert_eq!(response, EventResponse::NewWindow(NewWindowResponse::Deny));
        assert_eq!(
            manager.host().calls.last(),
            Some(&HostCall::OpenExternal("https://example.com".to_string()))
        );
    }

    #[test]
    fn test_non_http_popup_is_dropped() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        let calls_before = manager.host().calls.len();

        for url in ["mailto:someone@example.com", "ftp://files.example.com/a", "javascript:alert(1)"] {
            let response = manager.dispatch(
                &main_handle(),
                WindowEvent::NewWindowRequested { url: url.to_string() },
            );
            assert_eq!(response, EventResponse::NewWindow(NewWindowResponse::Deny), "{}", url);
        }
        assert_eq!(manager.host().calls.len(), calls_before);
    }

    #[test]
    fn test_hide_to_tray_closes_auxiliary_windows_once() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.open_sign_in().unwrap();
        manager.open_options(OptionsTab::Settings).unwrap();

        assert!(manager.hide_main_to_tray());
        assert!(!manager.hide_main_to_tray());

        let host = manager.host();
        assert_eq!(host.count(|c| matches!(c, HostCall::Hide(l) if l == MAIN_WINDOW_LABEL)), 1);
        assert_eq!(host.count(|c| matches!(c, HostCall::Close(_))), 2);
        assert_eq!(host.live_labels(), vec![MAIN_WINDOW_LABEL.to_string()]);
        assert_eq!(manager.main_tray_state(), TrayState::HiddenToTray);
    }

    #[test]
    fn test_close_request_hides_main_and_closes_auxiliaries() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.open_options(OptionsTab::About).unwrap();

        let response = manager.dispatch(&main_handle(), WindowEvent::CloseRequested);

        assert_eq!(response, EventResponse::PreventDefault);
        assert!(!manager.is_main_visible());
        assert!(manager.host().window(OPTIONS_WINDOW_LABEL).unwrap().destroyed);
    }

    #[test]
    fn test_auth_window_closes_when_flow_returns_home() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        let auth = manager.open_sign_in().unwrap();

        let response = manager.dispatch(
            &auth,
            WindowEvent::WillNavigate { url: "https://accounts.google.com/challenge".to_string() },
        );
        assert_eq!(response, EventResponse::Continue);
        assert!(!manager.host().window(auth.label()).unwrap().destroyed);

        manager.dispatch(
            &auth,
            WindowEvent::WillNavigate { url: "https://gemini.google.com/app".to_string() },
        );
        assert!(manager.host().window(auth.label()).unwrap().destroyed);

        // The host's Closed notification is consumed exactly once
        assert_eq!(manager.kind_of(&auth), Some(WindowKind::Auth));
        manager.dispatch(&auth, WindowEvent::Closed);
        assert_eq!(manager.kind_of(&auth), None);
    }

    #[test]
    fn test_auth_certificate_errors_are_rejected() {
        let mut manager = test_manager();
        let auth = manager.open_sign_in().unwrap();

        let response = manager.dispatch(
            &auth,
            WindowEvent::CertificateError { url: "https://accounts.google.com".to_string() },
        );
        assert_eq!(response, EventResponse::Certificate { trusted: false });
    }

    #[test]
    fn test_zoom_steps_persist_and_emit() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        let mut rx = manager.subscribe();

        assert_eq!(manager.zoom_in(), ZoomLevel::new(110));
        assert_eq!(manager.zoom_in(), ZoomLevel::new(125));
        assert_eq!(manager.zoom_out(), ZoomLevel::new(110));
        assert_eq!(manager.reset_zoom(), ZoomLevel::new(100));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert_eq!(events[1], ManagerEvent::ZoomLevelChanged { level: ZoomLevel::new(125) });
        assert_eq!(read_setting::<u32>(manager.settings(), ZOOM_LEVEL_KEY), Some(100));
        assert_eq!(manager.host().window(MAIN_WINDOW_LABEL).unwrap().zoom_factor, 1.0);
    }

    #[test]
    fn test_zoom_clamps_and_only_emits_on_change() {
        let mut manager = test_manager();
        let mut rx = manager.subscribe();

        assert_eq!(manager.set_zoom_level(500), ZoomLevel::new(200));
        assert_eq!(manager.zoom_in(), ZoomLevel::new(200));
        assert_eq!(manager.set_zoom_level(10), ZoomLevel::new(50));
        assert_eq!(manager.zoom_out(), ZoomLevel::new(50));
        assert_eq!(manager.reset_zoom(), ZoomLevel::new(100));
        assert_eq!(manager.reset_zoom(), ZoomLevel::new(100));

        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[test]
    fn test_always_on_top_toggle() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        let mut rx = manager.subscribe();

        assert!(manager.toggle_always_on_top());
        assert!(!manager.set_always_on_top(true));
        assert!(!manager.toggle_always_on_top());

        assert!(!manager.host().window(MAIN_WINDOW_LABEL).unwrap().always_on_top);
        assert_eq!(read_setting::<bool>(manager.settings(), ALWAYS_ON_TOP_KEY), Some(false));
        assert_eq!(
            drain(&mut rx),
            vec![
                ManagerEvent::AlwaysOnTopChanged { enabled: true },
                ManagerEvent::AlwaysOnTopChanged { enabled: false },
            ]
        );
    }

    #[test]
    fn test_hotkey_edits_emit_events() {
        let mut manager = test_manager();
        let mut rx = manager.subscribe();

        manager.set_hotkey_accelerator(HotkeyId::QuickChat, "Ctrl+Shift+K").unwrap();
        manager.set_hotkey_accelerator(HotkeyId::QuickChat, "Ctrl+Shift+K").unwrap();
        manager.set_hotkey_enabled(HotkeyId::AlwaysOnTop, false).unwrap();
        assert!(manager.set_hotkey_accelerator(HotkeyId::QuickChat, "K").is_err());

        assert_eq!(
            drain(&mut rx),
            vec![
                ManagerEvent::AcceleratorChanged {
                    id: HotkeyId::QuickChat,
                    accelerator: Some("Ctrl+Shift+K".to_string()),
                },
                ManagerEvent::HotkeyEnabledChanged { id: HotkeyId::AlwaysOnTop, enabled: false },
            ]
        );
    }

    #[test]
    fn test_hotkeys_drive_windows() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();

        manager.handle_hotkey(HotkeyId::PeekAndHide).unwrap();
        assert!(!manager.is_main_visible());
        manager.handle_hotkey(HotkeyId::PeekAndHide).unwrap();
        assert!(manager.is_main_visible());

        manager.handle_hotkey(HotkeyId::QuickChat).unwrap();
        assert!(manager.host().window(QUICK_CHAT_WINDOW_LABEL).unwrap().visible);

        manager.handle_hotkey(HotkeyId::AlwaysOnTop).unwrap();
        assert!(manager.is_always_on_top());

        manager.set_hotkey_enabled(HotkeyId::AlwaysOnTop, false).unwrap();
        manager.handle_hotkey(HotkeyId::AlwaysOnTop).unwrap();
        assert!(manager.is_always_on_top());
    }

    #[test]
    fn test_global_hotkey_edits_mark_registration_stale() {
        let mut manager = test_manager();
        let mut shortcuts = ShortcutSynchronizer::new(manager.subscribe());
        assert!(!shortcuts.take_pending());

        manager.zoom_in();
        assert!(!shortcuts.take_pending());

        manager
            .set_hotkey_accelerator(HotkeyId::PeekAndHide, "CommandOrControl+Alt+P")
            .unwrap();
        assert!(shortcuts.take_pending());
        assert!(manager
            .hotkeys()
            .global_shortcuts()
            .contains(&(HotkeyId::PeekAndHide, "CommandOrControl+Alt+P".to_string())));
    }

    #[test]
    fn test_submit_quick_chat_forwards_text_to_main() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.hide_main_to_tray();
        manager.toggle_quick_chat().unwrap();

        assert!(!manager.submit_quick_chat("   ").unwrap());
        assert!(manager.submit_quick_chat("  hello there ").unwrap());

        let host = manager.host();
        assert!(!host.window(QUICK_CHAT_WINDOW_LABEL).unwrap().visible);
        assert!(host.window(MAIN_WINDOW_LABEL).unwrap().visible);
        assert_eq!(
            host.calls.last(),
            Some(&HostCall::Send(
                MAIN_WINDOW_LABEL.to_string(),
                QUICK_CHAT_SUBMIT_CHANNEL.to_string(),
                json!({ "text": "hello there" }),
            ))
        );
    }

    #[test]
    fn test_quick_chat_hides_on_blur_and_tracks_readiness() {
        let mut manager = test_manager();
        manager.toggle_quick_chat().unwrap();
        let handle = WindowHandle::new(QUICK_CHAT_WINDOW_LABEL);

        manager.dispatch(&handle, WindowEvent::ContentLoaded);
        assert!(manager.is_quick_chat_ready());

        manager.dispatch(&handle, WindowEvent::Focused(false));
        assert!(!manager.host().window(QUICK_CHAT_WINDOW_LABEL).unwrap().visible);
    }

    #[test]
    fn test_quit_closes_everything_for_real() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.open_options(OptionsTab::Settings).unwrap();
        manager.toggle_quick_chat().unwrap();

        manager.handle_tray_action(TrayAction::Quit).unwrap();

        assert!(manager.is_quitting());
        assert!(manager.host().live_labels().is_empty());
        assert_eq!(
            manager.dispatch(&main_handle(), WindowEvent::CloseRequested),
            EventResponse::Continue
        );
    }

    #[test]
    fn test_close_without_tray_destroys_main() {
        let mut manager = WindowManager::new(
            MockHost::new(),
            Box::new(MemorySettingsStore::new()),
            PlatformPolicy::for_os(Os::Linux).without_tray(),
        );
        manager.create_main_window().unwrap();

        assert_eq!(
            manager.dispatch(&main_handle(), WindowEvent::CloseRequested),
            EventResponse::Continue
        );
    }

    #[test]
    fn test_closing_main_without_tray_takes_quick_chat_along() {
        let mut manager = WindowManager::new(
            MockHost::new(),
            Box::new(MemorySettingsStore::new()),
            PlatformPolicy::for_os(Os::Windows).without_tray(),
        );
        manager.create_main_window().unwrap();
        manager.open_options(OptionsTab::Settings).unwrap();
        manager.toggle_quick_chat().unwrap();
        manager.hide_quick_chat();

        let response = manager.dispatch(&main_handle(), WindowEvent::CloseRequested);
        assert_eq!(response, EventResponse::Continue);
        manager.host_mut().destroy_externally(MAIN_WINDOW_LABEL);
        manager.dispatch(&main_handle(), WindowEvent::Closed);

        assert!(manager.host().live_labels().is_empty());
    }

    #[test]
    fn test_hiding_to_tray_keeps_quick_chat() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.toggle_quick_chat().unwrap();

        manager.dispatch(&main_handle(), WindowEvent::CloseRequested);

        assert!(!manager.host().window(QUICK_CHAT_WINDOW_LABEL).unwrap().destroyed);
    }

    #[test]
    fn test_reopening_hidden_main_does_not_repeat_tray_side_effects() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        assert!(manager.hide_main_to_tray());
        manager.open_options(OptionsTab::Settings).unwrap();

        manager.create_main_window().unwrap();
        assert!(!manager.hide_main_to_tray());

        let host = manager.host();
        assert_eq!(host.count(|c| matches!(c, HostCall::Hide(l) if l == MAIN_WINDOW_LABEL)), 1);
        assert!(!host.window(OPTIONS_WINDOW_LABEL).unwrap().destroyed);
        assert_eq!(manager.main_tray_state(), TrayState::HiddenToTray);
    }

    #[test]
    fn test_crash_reload_reapplies_zoom() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.set_zoom_level(150);

        manager.dispatch(
            &main_handle(),
            WindowEvent::RenderProcessGone { reason: RenderGoneReason::Crashed },
        );
        assert_eq!(
            &manager.host().calls[manager.host().calls.len() - 2..],
            &[
                HostCall::Reload(MAIN_WINDOW_LABEL.to_string()),
                HostCall::SetZoom(MAIN_WINDOW_LABEL.to_string(), 1.5),
            ]
        );

        manager.dispatch(
            &main_handle(),
            WindowEvent::RenderProcessGone { reason: RenderGoneReason::Killed },
        );
        assert_eq!(manager.host().count(|c| matches!(c, HostCall::Reload(_))), 1);
    }

    #[test]
    fn test_move_persists_bounds() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager
            .host_mut()
            .set_position(&main_handle(), Point::new(120.0, 90.0))
            .unwrap();

        manager.dispatch(&main_handle(), WindowEvent::Moved(Point::new(120.0, 90.0)));
        manager.dispatch(&main_handle(), WindowEvent::Resized(Size::new(1200.0, 800.0)));

        let bounds: WindowBounds = read_setting(manager.settings(), WINDOW_BOUNDS_KEY).unwrap();
        assert_eq!(bounds.x, Some(120));
        assert_eq!(bounds.y, Some(90));
    }

    #[test]
    fn test_untracked_windows_get_safe_answers() {
        let mut manager = test_manager();
        let stranger = WindowHandle::new("popup-1");

        assert_eq!(
            manager.dispatch(&stranger, WindowEvent::NewWindowRequested { url: "https://example.com".to_string() }),
            EventResponse::NewWindow(NewWindowResponse::Deny)
        );
        assert_eq!(
            manager.dispatch(&stranger, WindowEvent::CertificateError { url: "https://example.com".to_string() }),
            EventResponse::Certificate { trusted: false }
        );
        assert_eq!(
            manager.dispatch(&stranger, WindowEvent::WillNavigate { url: "https://evil.example".to_string() }),
            EventResponse::PreventDefault
        );
        assert_eq!(manager.dispatch(&stranger, WindowEvent::Closed), EventResponse::Continue);
    }

    #[test]
    fn test_allowed_popup_stays_under_navigation_policy() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        assert_eq!(
            manager.dispatch(
                &main_handle(),
                WindowEvent::NewWindowRequested { url: "https://gemini.google.com/share/abc".to_string() },
            ),
            EventResponse::NewWindow(NewWindowResponse::Allow)
        );

        // The shell builds the popup itself under a fresh untracked label
        let popup = WindowHandle::popup();
        assert_eq!(manager.kind_of(&popup), None);
        assert_eq!(
            manager.dispatch(&popup, WindowEvent::WillNavigate { url: "https://gemini.google.com/app".to_string() }),
            EventResponse::Continue
        );
        assert_eq!(
            manager.dispatch(&popup, WindowEvent::WillNavigate { url: "https://phish.example.net/login".to_string() }),
            EventResponse::PreventDefault
        );
        assert_eq!(
            manager.dispatch(
                &popup,
                WindowEvent::NewWindowRequested { url: "https://gemini.google.com/share/def".to_string() },
            ),
            EventResponse::NewWindow(NewWindowResponse::Deny)
        );
        assert_eq!(manager.host().live_labels(), vec![MAIN_WINDOW_LABEL.to_string()]);
    }

    #[test]
    fn test_menu_actions_route_to_windows() {
        let mut manager = manager_for(Os::MacOs);
        manager.create_main_window().unwrap();

        manager.handle_menu_action(MenuAction::OpenAbout).unwrap();
        assert_eq!(
            manager.host().window(OPTIONS_WINDOW_LABEL).unwrap().source,
            ContentSource::App("index.html#/options/about".to_string())
        );

        manager.handle_menu_action(MenuAction::ZoomIn).unwrap();
        assert_eq!(manager.zoom_level(), ZoomLevel::new(110));

        manager.handle_menu_action(MenuAction::SignIn).unwrap();
        assert_eq!(auth_labels(&manager).len(), 1);

        manager.handle_menu_action(MenuAction::HideToTray).unwrap();
        assert!(auth_labels(&manager).is_empty());
    }

    #[test]
    fn test_refresh_menu_installs_current_state() {
        let mut manager = test_manager();
        manager.set_zoom_level(125);
        manager.refresh_menu().unwrap();

        assert_eq!(manager.host().menus.len(), 1);
        assert_eq!(manager.host().menus[0], manager.application_menu());
    }

    #[test]
    fn test_externally_destroyed_main_window_is_tolerated() {
        let mut manager = test_manager();
        manager.create_main_window().unwrap();
        manager.host_mut().destroy_externally(MAIN_WINDOW_LABEL);

        assert!(!manager.hide_main_to_tray());
        assert_eq!(manager.zoom_in(), ZoomLevel::new(110));
        assert!(!manager.reload_main_window());

        // Restoring rebuilds it
        manager.restore_main_window().unwrap();
        assert_eq!(manager.host().window(MAIN_WINDOW_LABEL).unwrap().zoom_factor, 1.1);
    }

    #[test]
    fn test_tray_action_ids() {
        assert_eq!(TrayAction::from_id("tray-show"), Some(TrayAction::Show));
        assert_eq!(TrayAction::from_id(TrayAction::Quit.id()), Some(TrayAction::Quit));
        assert_eq!(TrayAction::from_id("nope"), None);
    }
}
