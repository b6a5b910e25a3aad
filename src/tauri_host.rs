//! # Tauri Host
//!
//! [`HostRuntime`] on top of Tauri 2, plus the glue that feeds native events
//! back into the [`WindowManager`].
//!
//! ## Threading
//!
//! The manager lives in managed state behind a `Mutex` and is only touched
//! from the main thread: commands are synchronous, and background work hops
//! over with `run_on_main_thread`. Webview callbacks can fire while the
//! manager is already locked (e.g. the first navigation of a window being
//! built inside `create_main_window`). In that case the callback answers from
//! the pure navigation policy and the event is dispatched again once the lock
//! is free.
//!
//! ## Popups
//!
//! A popup the manager allows is built here rather than by the webview, so
//! it gets the same navigation, popup and window-event hooks as every other
//! window. Its `popup-<uuid>` label is unknown to the manager.
//!
//! ## Not surfaced by Tauri
//!
//! Tauri does not report render-process termination, load failures,
//! unresponsive renderers or certificate errors. The webview already rejects
//! invalid certificates, which is the answer the core would give anyway.

use std::sync::{Mutex, TryLockError};

use serde_json::Value;
use tauri::menu::{
    CheckMenuItemBuilder, Menu, MenuBuilder, MenuEvent, MenuItem as NativeMenuItem, MenuItemBuilder,
    SubmenuBuilder,
};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::webview::{NewWindowFeatures, NewWindowResponse as NativeNewWindowResponse, PageLoadEvent};
use tauri::{AppHandle, LogicalPosition, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, Wry};
use tauri_plugin_opener::OpenerExt;

use crate::constants::MAIN_WINDOW_TITLE;
use crate::errors::{WindowError, WindowResult};
use crate::global_shortcuts;
use crate::host::{ContentSource, EventResponse, HostRuntime, NewWindowResponse, WindowConfig, WindowEvent};
use crate::hotkeys::ShortcutSynchronizer;
use crate::menu::{EditCommand, EditContextMenu, EditFlags, MenuAction, MenuItem, MenuModel, MenuSynchronizer, PredefinedItem};
use crate::navigation::{default_policy, NavigationDecision};
use crate::platform::PlatformPolicy;
use crate::settings::FileSettingsStore;
use crate::types::{Display, Point, Rect, Size, WindowBounds, WindowHandle, WindowKind};
use crate::window_manager::{TrayAction, WindowManager};

/// Managed state holding the one window manager of the app
pub struct ManagerState(pub Mutex<WindowManager<TauriHost>>);

impl From<tauri::Error> for WindowError {
    fn from(error: tauri::Error) -> Self {
        WindowError::Host {
            message: error.to_string(),
        }
    }
}

pub struct TauriHost {
    app: AppHandle,
}

impl TauriHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn window(&self, handle: &WindowHandle) -> WindowResult<WebviewWindow> {
        self.app
            .get_webview_window(handle.label())
            .ok_or_else(|| match WindowKind::from_label(handle.label()) {
                Some(kind) => WindowError::WindowNotFound { kind },
                None => WindowError::Host {
                    message: format!("window '{}' does not exist", handle),
                },
            })
    }
}

/// Bundled pages are served from `tauri://localhost` or, on Windows, `http(s)://tauri.localhost`
fn is_app_origin(url: &url::Url) -> bool {
    url.scheme() == "tauri" || url.host_str() == Some("tauri.localhost")
}

fn parse_url(url: &str) -> WindowResult<url::Url> {
    url.parse().map_err(|_| WindowError::InvalidUrl { url: url.to_string() })
}

impl HostRuntime for TauriHost {
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<WindowHandle> {
        let url = match &config.content {
            ContentSource::App(path) => WebviewUrl::App(path.into()),
            ContentSource::Remote(url) => WebviewUrl::External(parse_url(url)?),
        };

        let builder = WebviewWindowBuilder::new(&self.app, &config.label, url)
            .title(&config.title)
            .inner_size(config.size.width, config.size.height)
            .maximized(config.maximized)
            .resizable(config.resizable)
            .decorations(config.decorations)
            .transparent(config.transparent)
            .always_on_top(config.always_on_top)
            .skip_taskbar(config.skip_taskbar)
            .visible(config.visible);
        let mut builder = route_webview_events(&self.app, &config.label, builder);

        if let Some(min) = config.min_size {
            builder = builder.min_inner_size(min.width, min.height);
        }
        builder = match config.position {
            Some(position) => builder.position(position.x, position.y),
            None => builder.center(),
        };
        if let Some(script) = &config.bridge_script {
            builder = builder.initialization_script(script);
        }

        let window = builder.build()?;
        route_window_events(&self.app, &config.label, &window);

        Ok(WindowHandle::new(config.label.clone()))
    }

    fn is_destroyed(&self, handle: &WindowHandle) -> bool {
        self.app.get_webview_window(handle.label()).is_none()
    }

    fn is_visible(&self, handle: &WindowHandle) -> bool {
        self.window(handle)
            .and_then(|w| w.is_visible().map_err(WindowError::from))
            .unwrap_or(false)
    }

    fn show(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        Ok(self.window(handle)?.show()?)
    }

    fn hide(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        Ok(self.window(handle)?.hide()?)
    }

    fn focus(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        Ok(self.window(handle)?.set_focus()?)
    }

    fn close(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        Ok(self.window(handle)?.close()?)
    }

    fn navigate(&mut self, handle: &WindowHandle, source: &ContentSource) -> WindowResult<()> {
        let window = self.window(handle)?;
        let target = match source {
            ContentSource::App(path) => window
                .url()?
                .join(path)
                .map_err(|_| WindowError::InvalidUrl { url: path.clone() })?,
            ContentSource::Remote(url) => parse_url(url)?,
        };
        Ok(window.navigate(target)?)
    }

    fn reload(&mut self, handle: &WindowHandle) -> WindowResult<()> {
        Ok(self.window(handle)?.eval("window.location.reload()")?)
    }

    fn set_always_on_top(&mut self, handle: &WindowHandle, on_top: bool) -> WindowResult<()> {
        Ok(self.window(handle)?.set_always_on_top(on_top)?)
    }

    fn set_skip_taskbar(&mut self, handle: &WindowHandle, skip: bool) -> WindowResult<()> {
        Ok(self.window(handle)?.set_skip_taskbar(skip)?)
    }

    fn set_zoom_factor(&mut self, handle: &WindowHandle, factor: f64) -> WindowResult<()> {
        Ok(self.window(handle)?.set_zoom(factor)?)
    }

    fn set_position(&mut self, handle: &WindowHandle, position: Point) -> WindowResult<()> {
        Ok(self
            .window(handle)?
            .set_position(LogicalPosition::new(position.x, position.y))?)
    }

    fn bounds(&self, handle: &WindowHandle) -> WindowResult<WindowBounds> {
        let window = self.window(handle)?;
        let scale = window.scale_factor()?;
        let size = window.inner_size()?.to_logical::<f64>(scale);
        let position = window.outer_position()?.to_logical::<i32>(scale);
        Ok(WindowBounds {
            width: size.width,
            height: size.height,
            x: Some(position.x),
            y: Some(position.y),
            maximized: window.is_maximized()?,
        })
    }

    fn cursor_position(&self) -> WindowResult<Point> {
        let cursor = self.app.cursor_position()?;
        let scale = self
            .app
            .monitor_from_point(cursor.x, cursor.y)?
            .map(|m| m.scale_factor())
            .unwrap_or(1.0);
        Ok(Point::new(cursor.x / scale, cursor.y / scale))
    }

    fn displays(&self) -> WindowResult<Vec<Display>> {
        let monitors = self.app.available_monitors()?;
        Ok(monitors
            .iter()
            .map(|monitor| {
                let scale = monitor.scale_factor();
                let position = monitor.position();
                let size = monitor.size();
                let work_area = monitor.work_area();
                Display {
                    bounds: Rect::new(
                        f64::from(position.x) / scale,
                        f64::from(position.y) / scale,
                        f64::from(size.width) / scale,
                        f64::from(size.height) / scale,
                    ),
                    work_area: Rect::new(
                        f64::from(work_area.position.x) / scale,
                        f64::from(work_area.position.y) / scale,
                        f64::from(work_area.size.width) / scale,
                        f64::from(work_area.size.height) / scale,
                    ),
                    scale_factor: scale,
                }
            })
            .collect())
    }

    fn open_external(&mut self, url: &str) -> WindowResult<()> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| WindowError::Host {
                message: format!("Failed to open '{}': {}", url, e),
            })
    }

    fn set_application_menu(&mut self, menu: &MenuModel) -> WindowResult<()> {
        let native = build_native_menu(&self.app, menu)?;
        self.app.set_menu(native)?;
        Ok(())
    }

    fn send_to_content(&mut self, handle: &WindowHandle, channel: &str, payload: Value) -> WindowResult<()> {
        let script = format!(
            "window.__geminiDesktop && window.__geminiDesktop.__dispatch({}, {});",
            serde_json::to_string(channel)?,
            payload
        );
        Ok(self.window(handle)?.eval(&script)?)
    }
}

type WindowBuilder<'a> = WebviewWindowBuilder<'a, Wry, AppHandle>;

/// Hook navigation, popups and page loads of a webview up to the manager
fn route_webview_events<'a>(app: &AppHandle, label: &str, builder: WindowBuilder<'a>) -> WindowBuilder<'a> {
    let navigation_app = app.clone();
    let navigation_label = label.to_string();
    let popup_app = app.clone();
    let popup_label = label.to_string();

    builder
        .on_navigation(move |url| {
            // about:blank is where opened popups start before their target loads
            if is_app_origin(url) || url.as_str() == "about:blank" {
                return true;
            }
            let fallback = match default_policy().navigation_decision(url.as_str()) {
                NavigationDecision::Allow => EventResponse::Continue,
                NavigationDecision::Cancel => EventResponse::PreventDefault,
            };
            let event = WindowEvent::WillNavigate { url: url.to_string() };
            dispatch_event(&navigation_app, &navigation_label, event, fallback) != EventResponse::PreventDefault
        })
        .on_new_window(move |url, features| {
            let event = WindowEvent::NewWindowRequested { url: url.to_string() };
            let fallback = EventResponse::NewWindow(NewWindowResponse::Deny);
            match dispatch_event(&popup_app, &popup_label, event, fallback) {
                EventResponse::NewWindow(NewWindowResponse::Allow) => match open_popup(&popup_app, &url, features) {
                    Ok(window) => NativeNewWindowResponse::Create { window },
                    Err(e) => {
                        log::error!("❌ Failed to open popup for {}: {}", url, e);
                        NativeNewWindowResponse::Deny
                    }
                },
                _ => NativeNewWindowResponse::Deny,
            }
        })
        .on_page_load(|window, payload| {
            if matches!(payload.event(), PageLoadEvent::Finished) {
                dispatch_event(
                    window.app_handle(),
                    window.label(),
                    WindowEvent::ContentLoaded,
                    EventResponse::Continue,
                );
            }
        })
}

fn route_window_events(app: &AppHandle, label: &str, window: &WebviewWindow) {
    let app = app.clone();
    let label = label.to_string();
    window.on_window_event(move |event| forward_window_event(&app, &label, event));
}

/// Build an allowed popup ourselves so it stays under the navigation policy.
///
/// The core does not track popups; their events arrive under an unknown
/// label and get the untracked-window treatment.
fn open_popup(app: &AppHandle, url: &url::Url, features: NewWindowFeatures) -> WindowResult<WebviewWindow> {
    let handle = WindowHandle::popup();
    let builder = WebviewWindowBuilder::new(app, handle.label(), WebviewUrl::External(parse_url("about:blank")?))
        .window_features(features)
        .title(url.host_str().unwrap_or(MAIN_WINDOW_TITLE));
    let window = route_webview_events(app, handle.label(), builder).build()?;
    route_window_events(app, handle.label(), &window);
    log::info!("🪟 Opened first-party popup '{}' for {}", handle, url);
    Ok(window)
}

fn build_native_menu(app: &AppHandle, model: &MenuModel) -> tauri::Result<Menu<Wry>> {
    let mut menu = MenuBuilder::new(app);
    for submenu in &model.submenus {
        let mut builder = SubmenuBuilder::new(app, &submenu.title);
        for item in &submenu.items {
            builder = match item {
                MenuItem::Separator => builder.separator(),
                MenuItem::Predefined(predefined) => match predefined {
                    PredefinedItem::Undo => builder.undo(),
                    PredefinedItem::Redo => builder.redo(),
                    PredefinedItem::Cut => builder.cut(),
                    PredefinedItem::Copy => builder.copy(),
                    PredefinedItem::Paste => builder.paste(),
                    PredefinedItem::SelectAll => builder.select_all(),
                    PredefinedItem::Minimize => builder.minimize(),
                    PredefinedItem::Hide => builder.hide(),
                    PredefinedItem::HideOthers => builder.hide_others(),
                    PredefinedItem::ShowAll => builder.show_all(),
                    PredefinedItem::Fullscreen => builder.fullscreen(),
                },
                MenuItem::Action {
                    action,
                    label,
                    accelerator,
                    enabled,
                    checked: Some(checked),
                } => {
                    let mut item = CheckMenuItemBuilder::with_id(action.id(), label)
                        .checked(*checked)
                        .enabled(*enabled);
                    if let Some(accelerator) = accelerator {
                        item = item.accelerator(accelerator);
                    }
                    builder.item(&item.build(app)?)
                }
                MenuItem::Action {
                    action,
                    label,
                    accelerator,
                    enabled,
                    checked: None,
                } => {
                    let mut item = MenuItemBuilder::with_id(action.id(), label).enabled(*enabled);
                    if let Some(accelerator) = accelerator {
                        item = item.accelerator(accelerator);
                    }
                    builder.item(&item.build(app)?)
                }
            };
        }
        menu = menu.item(&builder.build()?);
    }
    menu.build()
}

/// Dispatch into the manager, or answer with `fallback` if it is busy.
///
/// Busy means the event was raised from inside a manager call on this thread.
/// The event is then replayed on the main thread once that call has returned,
/// except `CloseRequested`, which can only be answered now.
fn dispatch_event(app: &AppHandle, label: &str, event: WindowEvent, fallback: EventResponse) -> EventResponse {
    let handle = WindowHandle::new(label);
    let state = app.state::<ManagerState>();
    let response = match state.0.try_lock() {
        Ok(mut manager) => manager.dispatch(&handle, event),
        Err(TryLockError::WouldBlock) => {
            if !matches!(event, WindowEvent::CloseRequested) {
                let replay_app = app.clone();
                let replay = move || {
                    let state = replay_app.state::<ManagerState>();
                    let Ok(mut manager) = state.0.lock() else {
                        log::error!("❌ Window manager lock poisoned, dropping replayed event");
                        return;
                    };
                    manager.dispatch(&handle, event);
                };
                // Posting from the main thread would run the task inline, under our own lock
                let post_app = app.clone();
                tauri::async_runtime::spawn(async move {
                    if let Err(e) = post_app.run_on_main_thread(replay) {
                        log::warn!("⚠️ Could not replay window event: {}", e);
                    }
                });
            }
            fallback
        }
        Err(TryLockError::Poisoned(_)) => {
            log::error!("❌ Window manager lock poisoned, answering '{}' with fallback", label);
            fallback
        }
    };
    response
}

fn scale_factor(app: &AppHandle, label: &str) -> f64 {
    app.get_webview_window(label)
        .and_then(|w| w.scale_factor().ok())
        .unwrap_or(1.0)
}

fn forward_window_event(app: &AppHandle, label: &str, event: &tauri::WindowEvent) {
    match event {
        tauri::WindowEvent::CloseRequested { api, .. } => {
            let response = dispatch_event(app, label, WindowEvent::CloseRequested, EventResponse::Continue);
            if response == EventResponse::PreventDefault {
                api.prevent_close();
            }
        }
        tauri::WindowEvent::Destroyed => {
            dispatch_event(app, label, WindowEvent::Closed, EventResponse::Continue);
        }
        tauri::WindowEvent::Focused(focused) => {
            dispatch_event(app, label, WindowEvent::Focused(*focused), EventResponse::Continue);
        }
        tauri::WindowEvent::Moved(position) => {
            let position = position.to_logical::<f64>(scale_factor(app, label));
            let moved = WindowEvent::Moved(Point::new(position.x, position.y));
            dispatch_event(app, label, moved, EventResponse::Continue);
        }
        tauri::WindowEvent::Resized(size) => {
            let size = size.to_logical::<f64>(scale_factor(app, label));
            let resized = WindowEvent::Resized(Size::new(size.width, size.height));
            dispatch_event(app, label, resized, EventResponse::Continue);
        }
        _ => {}
    }
}

/// Run `operation` against the locked manager
pub fn with_manager<T>(
    app: &AppHandle,
    operation: impl FnOnce(&mut WindowManager<TauriHost>) -> WindowResult<T>,
) -> WindowResult<T> {
    let state = app.state::<ManagerState>();
    let mut manager = state.0.lock().map_err(|_| WindowError::Host {
        message: "window manager lock poisoned".to_string(),
    })?;
    operation(&mut manager)
}

/// Right-click edit menu: native items built once, enablement patched per show
pub struct EditMenuState(pub Mutex<EditMenuHandles>);

pub struct EditMenuHandles {
    model: EditContextMenu,
    menu: Menu<Wry>,
    items: Vec<(EditCommand, NativeMenuItem<Wry>)>,
}

impl EditMenuHandles {
    pub fn build(app: &AppHandle) -> tauri::Result<Self> {
        let model = EditContextMenu::new();
        let mut menu = MenuBuilder::new(app);
        let mut items = Vec::new();
        for entry in model.entries() {
            let item = MenuItemBuilder::with_id(entry.command.id(), entry.command.label())
                .enabled(entry.enabled)
                .build(app)?;
            menu = menu.item(&item);
            items.push((entry.command, item));
        }
        Ok(Self {
            model,
            menu: menu.build()?,
            items,
        })
    }

    /// Apply the content's edit flags and pop the menu up over `window`
    pub fn show(&mut self, window: &WebviewWindow, flags: EditFlags) -> WindowResult<()> {
        for command in self.model.patch(flags) {
            if let Some((_, item)) = self.items.iter().find(|(c, _)| *c == command) {
                item.set_enabled(self.model.is_enabled(command))?;
            }
        }
        Ok(window.popup_menu(&self.menu)?)
    }
}

fn run_edit_command(app: &AppHandle, command: EditCommand) {
    let script = match command {
        EditCommand::Cut => "document.execCommand('cut')",
        EditCommand::Copy => "document.execCommand('copy')",
        EditCommand::Paste => "document.execCommand('paste')",
        EditCommand::Delete => "document.execCommand('delete')",
        EditCommand::SelectAll => "document.execCommand('selectAll')",
    };
    let focused = app
        .webview_windows()
        .into_values()
        .find(|w| w.is_focused().unwrap_or(false));
    match focused {
        Some(window) => {
            if let Err(e) = window.eval(script) {
                log::warn!("⚠️ Edit command {:?} failed: {}", command, e);
            }
        }
        None => log::debug!("No focused window for edit command {:?}", command),
    }
}

/// Application menu and context menu clicks
pub fn handle_menu_event(app: &AppHandle, event: MenuEvent) {
    let id = event.id().as_ref();
    if let Some(action) = MenuAction::from_id(id) {
        if let Err(e) = with_manager(app, |manager| manager.handle_menu_action(action)) {
            log::error!("❌ Menu action {:?} failed: {}", action, e);
        }
    } else if let Some(command) = EditCommand::from_id(id) {
        run_edit_command(app, command);
    }
}

fn install_tray(app: &AppHandle) -> tauri::Result<()> {
    let show = MenuItemBuilder::with_id(TrayAction::Show.id(), "Show Gemini").build(app)?;
    let hide = MenuItemBuilder::with_id(TrayAction::Hide.id(), "Hide to Tray").build(app)?;
    let quit = MenuItemBuilder::with_id(TrayAction::Quit.id(), "Quit").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&show)
        .item(&hide)
        .separator()
        .item(&quit)
        .build()?;

    let mut tray = TrayIconBuilder::new()
        .menu(&menu)
        .tooltip("Gemini Desktop")
        .on_menu_event(|app, event| {
            let Some(action) = TrayAction::from_id(event.id().as_ref()) else {
                return;
            };
            if let Err(e) = with_manager(app, |manager| manager.handle_tray_action(action)) {
                log::error!("❌ Tray action {:?} failed: {}", action, e);
            }
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                if let Err(e) = with_manager(tray.app_handle(), |manager| manager.restore_main_window().map(|_| ())) {
                    log::error!("❌ Failed to restore main window from tray: {}", e);
                }
            }
        });
    if let Some(icon) = app.default_window_icon() {
        tray = tray.icon(icon.clone());
    }
    tray.build(app)?;
    Ok(())
}

/// Build the manager, open the main window, and start the menu and shortcut synchronizers
pub fn setup(app: &AppHandle) -> anyhow::Result<()> {
    let settings = FileSettingsStore::open_default()?;
    log::info!("⚙️ Using settings at {}", settings.path().display());

    let manager = WindowManager::new(TauriHost::new(app.clone()), Box::new(settings), PlatformPolicy::current());
    let synchronizer = MenuSynchronizer::new(manager.subscribe());
    let shortcut_synchronizer = ShortcutSynchronizer::new(manager.subscribe());
    app.manage(ManagerState(Mutex::new(manager)));
    app.manage(EditMenuState(Mutex::new(EditMenuHandles::build(app)?)));

    with_manager(app, |manager| {
        manager.create_main_window()?;
        manager.refresh_menu()
    })?;
    install_tray(app)?;
    global_shortcuts::install(app, shortcut_synchronizer);

    let sync_app = app.clone();
    tauri::async_runtime::spawn(synchronizer.run(move || {
        let main_thread_app = sync_app.clone();
        sync_app
            .run_on_main_thread(move || {
                if let Err(e) = with_manager(&main_thread_app, |manager| manager.refresh_menu()) {
                    log::error!("❌ Menu rebuild failed: {}", e);
                }
            })
            .map_err(WindowError::from)
    }));

    log::info!("✅ Gemini Desktop started");
    Ok(())
}
