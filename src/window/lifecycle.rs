//! # Window Lifecycle
//!
//! Shared creation, visibility and teardown logic for every window kind.
//!
//! A [`WindowRecord`] owns at most one native handle, tracked as an explicit
//! [`WindowState`]. Every public operation re-checks liveness with the host
//! right before touching the handle, so a window destroyed behind our back
//! (OS close, crash, another window's side effect) is demoted to `Absent`
//! instead of being used.
//!
//! Kind-specific behaviour plugs in through [`WindowContent`]: the
//! configuration template, the content source and an `on_created` hook.

use crate::constants::CONTENT_BRIDGE_SCRIPT;
use crate::errors::{WindowError, WindowResult};
use crate::host::{ContentSource, HostRuntime, WindowConfig};
use crate::types::{WindowHandle, WindowKind};

/// Ownership slot for a native window
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Never created, or fully torn down
    #[default]
    Absent,
    Live(WindowHandle),
    /// Close requested, waiting for the host's `Closed` notification
    Destroying(WindowHandle),
}

/// Kind-specific part of a window
pub trait WindowContent {
    fn kind(&self) -> WindowKind;

    /// Configuration template. `content` and `bridge_script` are filled in by the record.
    fn config(&self) -> WindowConfig;

    /// What to load into a freshly constructed window
    fn content_source(&self) -> ContentSource;

    /// Called once right after the native window exists
    fn on_created(&mut self, _host: &mut dyn HostRuntime, _handle: &WindowHandle) {}
}

#[derive(Debug, Clone)]
pub struct WindowRecord {
    kind: WindowKind,
    state: WindowState,
}

impl WindowRecord {
    pub fn new(kind: WindowKind) -> Self {
        Self {
            kind,
            state: WindowState::Absent,
        }
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    /// Whether `handle` belongs to this record, live or on its way out
    pub fn owns(&self, handle: &WindowHandle) -> bool {
        match &self.state {
            WindowState::Live(own) | WindowState::Destroying(own) => own == handle,
            WindowState::Absent => false,
        }
    }

    /// The live handle, after confirming with the host that it still exists
    pub fn live_handle(&mut self, host: &dyn HostRuntime) -> Option<WindowHandle> {
        match &self.state {
            WindowState::Live(handle) if host.is_destroyed(handle) => {
                log::warn!("⚠️ {} window was destroyed without notice, clearing record", self.kind);
                self.state = WindowState::Absent;
                None
            }
            WindowState::Live(handle) => Some(handle.clone()),
            WindowState::Absent | WindowState::Destroying(_) => None,
        }
    }

    pub fn is_live(&mut self, host: &dyn HostRuntime) -> bool {
        self.live_handle(host).is_some()
    }

    /// Return the live window (focused) or construct a new one
    pub fn create(
        &mut self,
        host: &mut dyn HostRuntime,
        content: &mut dyn WindowContent,
    ) -> WindowResult<WindowHandle> {
        if let Some(handle) = self.live_handle(&*host) {
            log::debug!("🔁 Reusing existing {} window", self.kind);
            if let Err(e) = host.focus(&handle) {
                log::warn!("⚠️ Failed to focus {} window: {}", self.kind, e);
            }
            return Ok(handle);
        }

        let mut config = content.config();
        config.content = content.content_source();
        config.bridge_script = Some(CONTENT_BRIDGE_SCRIPT.to_string());

        let handle = host.create_window(&config)?;
        if host.is_destroyed(&handle) {
            log::error!("❌ {} window '{}' was destroyed during construction", self.kind, handle);
            return Err(WindowError::WindowDestroyed { kind: self.kind });
        }
        log::info!("🪟 Created {} window '{}'", self.kind, handle);
        self.state = WindowState::Live(handle.clone());
        content.on_created(host, &handle);
        Ok(handle)
    }

    pub fn show(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.run_on_live(host, "show", |host, handle| host.show(handle))
    }

    pub fn hide(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.run_on_live(host, "hide", |host, handle| host.hide(handle))
    }

    pub fn focus(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.run_on_live(host, "focus", |host, handle| host.focus(handle))
    }

    pub fn is_visible(&mut self, host: &dyn HostRuntime) -> bool {
        self.live_handle(host)
            .map(|handle| host.is_visible(&handle))
            .unwrap_or(false)
    }

    /// Request the window to close. The record moves to `Destroying` until `Closed` arrives.
    pub fn close(&mut self, host: &mut dyn HostRuntime) -> bool {
        let Some(handle) = self.live_handle(&*host) else {
            log::warn!("⚠️ Ignoring close on {} window: no live handle", self.kind);
            return false;
        };

        self.state = WindowState::Destroying(handle.clone());
        if let Err(e) = host.close(&handle) {
            log::warn!("⚠️ Failed to close {} window: {}", self.kind, e);
        }
        true
    }

    /// Host reported the native window is gone. Returns `true` exactly once per handle.
    pub fn handle_closed(&mut self, handle: &WindowHandle) -> bool {
        if !self.owns(handle) {
            return false;
        }
        log::info!("🗑️ {} window '{}' closed", self.kind, handle);
        self.state = WindowState::Absent;
        true
    }

    /// Run `operation` against the live handle; warn and no-op otherwise.
    pub fn run_on_live<F>(&mut self, host: &mut dyn HostRuntime, name: &str, operation: F) -> bool
    where
        F: FnOnce(&mut dyn HostRuntime, &WindowHandle) -> WindowResult<()>,
    {
        let Some(handle) = self.live_handle(&*host) else {
            log::warn!("⚠️ Ignoring {} on {} window: no live handle", name, self.kind);
            return false;
        };

        match operation(host, &handle) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("⚠️ {} on {} window failed: {}", name, self.kind, e);
                false
            }
        }
    }
}
