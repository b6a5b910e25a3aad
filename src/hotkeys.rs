//! # Hotkeys
//!
//! Hotkey bindings are owned by a collaborator; the window core only reads
//! them through [`HotkeyProvider`]. [`HotkeyRegistry`] is the in-process
//! implementation the shell ships with. Changes made through it are reported
//! to the `WindowManager`, which turns them into bus events for the menu.
//!
//! Global-scoped bindings are also registered with the OS by the desktop
//! shell. [`ShortcutSynchronizer`] tells it when that registration is stale.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::errors::{WindowError, WindowResult};
use crate::events::{drain_relevant, run_batched, ManagerEvent};

static ACCELERATOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:CommandOrControl|CmdOrCtrl|Command|Cmd|Control|Ctrl|Alt|Option|AltGr|Shift|Super|Meta)\+)+(?:[A-Z0-9]|F(?:[1-9]|1[0-9]|2[0-4])|Space|Tab|Enter|Escape|Backspace|Delete|Up|Down|Left|Right|Home|End|PageUp|PageDown|Plus|Minus|[=,./;'`\[\]\\-])$",
    )
    .expect("accelerator pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotkeyId {
    AlwaysOnTop,
    PeekAndHide,
    QuickChat,
    Zoom,
}

impl HotkeyId {
    pub const ALL: [HotkeyId; 4] = [
        HotkeyId::AlwaysOnTop,
        HotkeyId::PeekAndHide,
        HotkeyId::QuickChat,
        HotkeyId::Zoom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HotkeyId::AlwaysOnTop => "alwaysOnTop",
            HotkeyId::PeekAndHide => "peekAndHide",
            HotkeyId::QuickChat => "quickChat",
            HotkeyId::Zoom => "zoom",
        }
    }

    /// Only these hotkeys have an entry in the application menu.
    pub fn is_menu_visible(&self) -> bool {
        matches!(self, HotkeyId::AlwaysOnTop | HotkeyId::QuickChat)
    }

    pub fn scope(&self) -> HotkeyScope {
        match self {
            HotkeyId::AlwaysOnTop | HotkeyId::PeekAndHide | HotkeyId::QuickChat => HotkeyScope::Global,
            HotkeyId::Zoom => HotkeyScope::Application,
        }
    }
}

impl fmt::Display for HotkeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HotkeyId {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HotkeyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| WindowError::UnknownHotkey { id: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotkeyScope {
    /// Registered with the OS, fires while the app is in the background
    Global,
    /// Only reachable through the application menu
    Application,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub id: HotkeyId,
    pub accelerator: Option<String>,
    pub enabled: bool,
    pub scope: HotkeyScope,
}

/// Read-only view of the hotkey collaborator
pub trait HotkeyProvider {
    fn is_individual_enabled(&self, id: HotkeyId) -> bool;
    fn accelerator(&self, id: HotkeyId) -> Option<String>;
}

/// Check an accelerator string such as `CommandOrControl+Alt+T`
pub fn validate_accelerator(accelerator: &str) -> WindowResult<()> {
    if ACCELERATOR_PATTERN.is_match(accelerator) {
        Ok(())
    } else {
        Err(WindowError::InvalidAccelerator {
            accelerator: accelerator.to_string(),
        })
    }
}

/// In-memory hotkey bindings with the shell's defaults
#[derive(Debug, Clone)]
pub struct HotkeyRegistry {
    bindings: HashMap<HotkeyId, HotkeyBinding>,
}

impl Default for HotkeyRegistry {
    fn default() -> Self {
        let defaults = [
            (HotkeyId::AlwaysOnTop, Some("CommandOrControl+Alt+T")),
            (HotkeyId::PeekAndHide, Some("CommandOrControl+Alt+H")),
            (HotkeyId::QuickChat, Some("CommandOrControl+Shift+Alt+Space")),
            (HotkeyId::Zoom, None),
        ];

        let bindings = defaults
            .into_iter()
            .map(|(id, accelerator)| {
                (
                    id,
                    HotkeyBinding {
                        id,
                        accelerator: accelerator.map(str::to_string),
                        enabled: true,
                        scope: id.scope(),
                    },
                )
            })
            .collect();

        Self { bindings }
    }
}

impl HotkeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binding(&self, id: HotkeyId) -> Option<&HotkeyBinding> {
        self.bindings.get(&id)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &HotkeyBinding> {
        HotkeyId::ALL.iter().filter_map(|id| self.bindings.get(id))
    }

    /// Enabled global bindings that have an accelerator, in `HotkeyId::ALL` order
    pub fn global_shortcuts(&self) -> Vec<(HotkeyId, String)> {
        self.bindings()
            .filter(|b| b.enabled && b.scope == HotkeyScope::Global)
            .filter_map(|b| b.accelerator.clone().map(|accelerator| (b.id, accelerator)))
            .collect()
    }

    /// Change an accelerator. Returns `true` when the stored value changed.
    pub fn set_accelerator(&mut self, id: HotkeyId, accelerator: &str) -> WindowResult<bool> {
        validate_accelerator(accelerator)?;
        let binding = self
            .bindings
            .get_mut(&id)
            .ok_or_else(|| WindowError::UnknownHotkey { id: id.to_string() })?;

        if binding.accelerator.as_deref() == Some(accelerator) {
            return Ok(false);
        }
        binding.accelerator = Some(accelerator.to_string());
        Ok(true)
    }

    /// Enable or disable a hotkey. Returns `true` when the stored value changed.
    pub fn set_individual_enabled(&mut self, id: HotkeyId, enabled: bool) -> WindowResult<bool> {
        let binding = self
            .bindings
            .get_mut(&id)
            .ok_or_else(|| WindowError::UnknownHotkey { id: id.to_string() })?;

        if binding.enabled == enabled {
            return Ok(false);
        }
        binding.enabled = enabled;
        Ok(true)
    }
}

impl HotkeyProvider for HotkeyRegistry {
    fn is_individual_enabled(&self, id: HotkeyId) -> bool {
        self.bindings.get(&id).map(|b| b.enabled).unwrap_or(false)
    }

    fn accelerator(&self, id: HotkeyId) -> Option<String> {
        self.bindings.get(&id).and_then(|b| b.accelerator.clone())
    }
}

/// Watches the manager's bus for changes to global bindings so the OS
/// registration can be redone. Menu-only changes are ignored.
pub struct ShortcutSynchronizer {
    rx: broadcast::Receiver<ManagerEvent>,
}

impl ShortcutSynchronizer {
    pub fn new(rx: broadcast::Receiver<ManagerEvent>) -> Self {
        Self { rx }
    }

    pub fn requires_reregistration(event: &ManagerEvent) -> bool {
        match event {
            ManagerEvent::AcceleratorChanged { id, .. } | ManagerEvent::HotkeyEnabledChanged { id, .. } => {
                id.scope() == HotkeyScope::Global
            }
            ManagerEvent::ZoomLevelChanged { .. } | ManagerEvent::AlwaysOnTopChanged { .. } => false,
        }
    }

    /// Drain queued events without blocking; `true` if the registration is stale
    pub fn take_pending(&mut self) -> bool {
        drain_relevant(&mut self.rx, Self::requires_reregistration, "Shortcut synchronizer")
    }

    /// Wait for events until the bus closes, calling `reregister` once per qualifying batch.
    pub async fn run<F>(self, reregister: F) -> u64
    where
        F: FnMut() -> WindowResult<()>,
    {
        run_batched(self.rx, Self::requires_reregistration, "Shortcut synchronizer", reregister).await
    }
}
