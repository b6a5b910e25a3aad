//! # Application Menu
//!
//! The native menu is described as plain data ([`MenuModel`]) and handed to
//! the host in one piece; the host turns it into toolkit menus. Keeping the
//! model pure makes every label, accelerator and check state testable.
//!
//! ## Rebuilding
//!
//! [`MenuSynchronizer`] listens on the manager's event bus and rebuilds the
//! whole menu when something it displays changes:
//! - accelerator or enabled state of a menu-visible hotkey
//! - zoom level (the percentage is part of the View item labels)
//! - always-on-top (check mark)
//!
//! Rebuilds are not diffed. A burst of events results in one rebuild.
//!
//! ## Edit Context Menu
//!
//! [`EditContextMenu`] is the right-click Cut/Copy/Paste/Delete/Select All
//! menu. Its template is built once; each invocation only patches enablement
//! from the content's current edit flags.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::constants::MAIN_WINDOW_TITLE;
use crate::errors::WindowResult;
use crate::events::{drain_relevant, run_batched, ManagerEvent};
use crate::host::HostRuntime;
use crate::hotkeys::{HotkeyId, HotkeyProvider};
use crate::platform::{MenuShape, PlatformPolicy};
use crate::types::ZoomLevel;
use crate::window_manager::WindowManager;

/// Every clickable item the application menu can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuAction {
    OpenSettings,
    OpenAbout,
    SignIn,
    Reload,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ToggleAlwaysOnTop,
    ToggleQuickChat,
    HideToTray,
    Quit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 11] = [
        MenuAction::OpenSettings,
        MenuAction::OpenAbout,
        MenuAction::SignIn,
        MenuAction::Reload,
        MenuAction::ZoomIn,
        MenuAction::ZoomOut,
        MenuAction::ResetZoom,
        MenuAction::ToggleAlwaysOnTop,
        MenuAction::ToggleQuickChat,
        MenuAction::HideToTray,
        MenuAction::Quit,
    ];

    /// Stable id used for native menu items
    pub fn id(&self) -> &'static str {
        match self {
            MenuAction::OpenSettings => "open-settings",
            MenuAction::OpenAbout => "open-about",
            MenuAction::SignIn => "sign-in",
            MenuAction::Reload => "reload",
            MenuAction::ZoomIn => "zoom-in",
            MenuAction::ZoomOut => "zoom-out",
            MenuAction::ResetZoom => "reset-zoom",
            MenuAction::ToggleAlwaysOnTop => "toggle-always-on-top",
            MenuAction::ToggleQuickChat => "toggle-quick-chat",
            MenuAction::HideToTray => "hide-to-tray",
            MenuAction::Quit => "quit",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        MenuAction::ALL.into_iter().find(|action| action.id() == id)
    }
}

/// Items the toolkit provides with native behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredefinedItem {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Minimize,
    Hide,
    HideOthers,
    ShowAll,
    Fullscreen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuItem {
    Action {
        action: MenuAction,
        label: String,
        accelerator: Option<String>,
        enabled: bool,
        /// `Some` renders a check item
        checked: Option<bool>,
    },
    Predefined(PredefinedItem),
    Separator,
}

impl MenuItem {
    fn action(action: MenuAction, label: impl Into<String>) -> Self {
        MenuItem::Action {
            action,
            label: label.into(),
            accelerator: None,
            enabled: true,
            checked: None,
        }
    }

    fn with_accelerator(mut self, value: Option<String>) -> Self {
        if let MenuItem::Action { accelerator, .. } = &mut self {
            *accelerator = value;
        }
        self
    }

    fn with_enabled(mut self, value: bool) -> Self {
        if let MenuItem::Action { enabled, .. } = &mut self {
            *enabled = value;
        }
        self
    }

    fn with_checked(mut self, value: bool) -> Self {
        if let MenuItem::Action { checked, .. } = &mut self {
            *checked = Some(value);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submenu {
    pub title: String,
    pub items: Vec<MenuItem>,
}

impl Submenu {
    fn new(title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

/// Full application menu, top-level submenus in display order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuModel {
    pub submenus: Vec<Submenu>,
}

impl MenuModel {
    pub fn submenu(&self, title: &str) -> Option<&Submenu> {
        self.submenus.iter().find(|s| s.title == title)
    }

    /// First item bound to `action`, wherever it lives
    pub fn find_action(&self, wanted: MenuAction) -> Option<&MenuItem> {
        self.submenus
            .iter()
            .flat_map(|s| s.items.iter())
            .find(|item| matches!(item, MenuItem::Action { action, .. } if *action == wanted))
    }
}

/// Accelerator shown next to a hotkey's menu item; disabled hotkeys show none
fn menu_accelerator(hotkeys: &dyn HotkeyProvider, id: HotkeyId) -> Option<String> {
    if hotkeys.is_individual_enabled(id) {
        hotkeys.accelerator(id)
    } else {
        None
    }
}

/// Build the application menu for the current state
pub fn build_application_menu(
    platform: &PlatformPolicy,
    zoom: ZoomLevel,
    always_on_top: bool,
    hotkeys: &dyn HotkeyProvider,
) -> MenuModel {
    let mut submenus = Vec::new();

    match platform.menu_shape {
        MenuShape::AppMenu => submenus.push(Submenu::new(
            MAIN_WINDOW_TITLE,
            vec![
                MenuItem::action(MenuAction::OpenAbout, format!("About {}", MAIN_WINDOW_TITLE)),
                MenuItem::Separator,
                MenuItem::action(MenuAction::OpenSettings, "Settings…")
                    .with_accelerator(Some("CmdOrCtrl+,".to_string())),
                MenuItem::action(MenuAction::SignIn, "Sign In…"),
                MenuItem::Separator,
                MenuItem::Predefined(PredefinedItem::Hide),
                MenuItem::Predefined(PredefinedItem::HideOthers),
                MenuItem::Predefined(PredefinedItem::ShowAll),
                MenuItem::Separator,
                MenuItem::action(MenuAction::Quit, format!("Quit {}", MAIN_WINDOW_TITLE))
                    .with_accelerator(Some("CmdOrCtrl+Q".to_string())),
            ],
        )),
        MenuShape::FileMenu => submenus.push(Submenu::new(
            "File",
            vec![
                MenuItem::action(MenuAction::OpenSettings, "Settings…")
                    .with_accelerator(Some("CmdOrCtrl+,".to_string())),
                MenuItem::action(MenuAction::SignIn, "Sign In…"),
                MenuItem::Separator,
                MenuItem::action(MenuAction::Quit, "Quit").with_accelerator(Some("CmdOrCtrl+Q".to_string())),
            ],
        )),
    }

    submenus.push(Submenu::new(
        "Edit",
        vec![
            MenuItem::Predefined(PredefinedItem::Undo),
            MenuItem::Predefined(PredefinedItem::Redo),
            MenuItem::Separator,
            MenuItem::Predefined(PredefinedItem::Cut),
            MenuItem::Predefined(PredefinedItem::Copy),
            MenuItem::Predefined(PredefinedItem::Paste),
            MenuItem::Predefined(PredefinedItem::SelectAll),
        ],
    ));

    submenus.push(Submenu::new(
        "View",
        vec![
            MenuItem::action(MenuAction::Reload, "Reload").with_accelerator(Some("CmdOrCtrl+R".to_string())),
            MenuItem::Separator,
            MenuItem::action(MenuAction::ZoomIn, format!("Zoom In ({})", zoom))
                .with_accelerator(Some("CmdOrCtrl+=".to_string()))
                .with_enabled(zoom.step_in() != zoom),
            MenuItem::action(MenuAction::ZoomOut, format!("Zoom Out ({})", zoom))
                .with_accelerator(Some("CmdOrCtrl+-".to_string()))
                .with_enabled(zoom.step_out() != zoom),
            MenuItem::action(MenuAction::ResetZoom, format!("Actual Size ({})", zoom))
                .with_accelerator(Some("CmdOrCtrl+0".to_string())),
            MenuItem::Separator,
            MenuItem::action(MenuAction::ToggleAlwaysOnTop, "Always On Top")
                .with_accelerator(menu_accelerator(hotkeys, HotkeyId::AlwaysOnTop))
                .with_checked(always_on_top),
            MenuItem::Predefined(PredefinedItem::Fullscreen),
        ],
    ));

    submenus.push(Submenu::new(
        "Window",
        vec![
            MenuItem::action(MenuAction::ToggleQuickChat, "Quick Chat")
                .with_accelerator(menu_accelerator(hotkeys, HotkeyId::QuickChat)),
            MenuItem::Separator,
            MenuItem::Predefined(PredefinedItem::Minimize),
            MenuItem::action(MenuAction::HideToTray, "Hide to Tray"),
        ],
    ));

    if platform.menu_shape == MenuShape::FileMenu {
        submenus.push(Submenu::new(
            "Help",
            vec![MenuItem::action(MenuAction::OpenAbout, format!("About {}", MAIN_WINDOW_TITLE))],
        ));
    }

    MenuModel { submenus }
}

/// Rebuilds the application menu in response to manager events
#[derive(Debug)]
pub struct MenuSynchronizer {
    rx: broadcast::Receiver<ManagerEvent>,
    rebuilds: u64,
}

impl MenuSynchronizer {
    pub fn new(rx: broadcast::Receiver<ManagerEvent>) -> Self {
        Self { rx, rebuilds: 0 }
    }

    /// Whether `event` changes anything the menu displays
    pub fn requires_rebuild(event: &ManagerEvent) -> bool {
        match event {
            ManagerEvent::AcceleratorChanged { id, .. } | ManagerEvent::HotkeyEnabledChanged { id, .. } => {
                id.is_menu_visible()
            }
            ManagerEvent::ZoomLevelChanged { .. } | ManagerEvent::AlwaysOnTopChanged { .. } => true,
        }
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Drain queued events without blocking and rebuild once if any of them matter.
    pub fn process_pending<H: HostRuntime>(&mut self, manager: &mut WindowManager<H>) -> WindowResult<bool> {
        if !self.drain_pending() {
            return Ok(false);
        }
        manager.refresh_menu()?;
        self.rebuilds += 1;
        log::debug!("🔄 Application menu rebuilt ({} total)", self.rebuilds);
        Ok(true)
    }

    /// Wait for events until the bus closes, calling `rebuild` once per qualifying batch.
    pub async fn run<F>(self, rebuild: F) -> u64
    where
        F: FnMut() -> WindowResult<()>,
    {
        self.rebuilds + run_batched(self.rx, Self::requires_rebuild, "Menu synchronizer", rebuild).await
    }

    fn drain_pending(&mut self) -> bool {
        drain_relevant(&mut self.rx, Self::requires_rebuild, "Menu synchronizer")
    }
}

/// Edit capabilities reported by the content for the element under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFlags {
    pub can_cut: bool,
    pub can_copy: bool,
    pub can_paste: bool,
    pub can_delete: bool,
    pub can_select_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditCommand {
    Cut,
    Copy,
    Paste,
    Delete,
    SelectAll,
}

impl EditCommand {
    pub const ALL: [EditCommand; 5] = [
        EditCommand::Cut,
        EditCommand::Copy,
        EditCommand::Paste,
        EditCommand::Delete,
        EditCommand::SelectAll,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            EditCommand::Cut => "edit-cut",
            EditCommand::Copy => "edit-copy",
            EditCommand::Paste => "edit-paste",
            EditCommand::Delete => "edit-delete",
            EditCommand::SelectAll => "edit-select-all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditCommand::Cut => "Cut",
            EditCommand::Copy => "Copy",
            EditCommand::Paste => "Paste",
            EditCommand::Delete => "Delete",
            EditCommand::SelectAll => "Select All",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        EditCommand::ALL.into_iter().find(|command| command.id() == id)
    }

    fn is_allowed(&self, flags: &EditFlags) -> bool {
        match self {
            EditCommand::Cut => flags.can_cut,
            EditCommand::Copy => flags.can_copy,
            EditCommand::Paste => flags.can_paste,
            EditCommand::Delete => flags.can_delete,
            EditCommand::SelectAll => flags.can_select_all,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMenuEntry {
    pub command: EditCommand,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct EditContextMenu {
    entries: Vec<EditMenuEntry>,
}

impl Default for EditContextMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl EditContextMenu {
    /// Everything starts disabled until the first patch
    pub fn new() -> Self {
        Self {
            entries: EditCommand::ALL
                .into_iter()
                .map(|command| EditMenuEntry { command, enabled: false })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[EditMenuEntry] {
        &self.entries
    }

    /// Update enablement in place. Returns the commands whose state changed.
    pub fn patch(&mut self, flags: EditFlags) -> Vec<EditCommand> {
        let mut changed = Vec::new();
        for entry in &mut self.entries {
            let enabled = entry.command.is_allowed(&flags);
            if entry.enabled != enabled {
                entry.enabled = enabled;
                changed.push(entry.command);
            }
        }
        changed
    }

    pub fn is_enabled(&self, command: EditCommand) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.command == command && entry.enabled)
    }
}
