//! Single-instance settings/about window addressed by tab.

use crate::constants::{OPTIONS_URL, OPTIONS_WINDOW_LABEL, OPTIONS_WINDOW_SIZE, OPTIONS_WINDOW_TITLE};
use crate::errors::WindowResult;
use crate::host::{ContentSource, HostRuntime, WindowConfig};
use crate::types::{OptionsTab, Size, WindowHandle, WindowKind};
use crate::window::lifecycle::{WindowContent, WindowRecord};

/// Local page for `tab`, e.g. `index.html#/options/about`
pub fn options_source(tab: OptionsTab) -> ContentSource {
    ContentSource::App(format!("{}/{}", OPTIONS_URL, tab.fragment()))
}

#[derive(Debug, Clone, Default)]
struct OptionsContent {
    pending_tab: OptionsTab,
}

impl WindowContent for OptionsContent {
    fn kind(&self) -> WindowKind {
        WindowKind::Options
    }

    fn config(&self) -> WindowConfig {
        let mut config = WindowConfig::new(
            OPTIONS_WINDOW_LABEL,
            WindowKind::Options,
            OPTIONS_WINDOW_TITLE,
            Size::new(OPTIONS_WINDOW_SIZE.0, OPTIONS_WINDOW_SIZE.1),
        );
        config.resizable = false;
        config
    }

    fn content_source(&self) -> ContentSource {
        options_source(self.pending_tab)
    }
}

#[derive(Debug)]
pub struct OptionsWindow {
    record: WindowRecord,
    content: OptionsContent,
}

impl Default for OptionsWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsWindow {
    pub fn new() -> Self {
        Self {
            record: WindowRecord::new(WindowKind::Options),
            content: OptionsContent::default(),
        }
    }

    /// Open on `tab`. An open window is switched to the tab in place and focused.
    pub fn create(&mut self, host: &mut dyn HostRuntime, tab: OptionsTab) -> WindowResult<WindowHandle> {
        self.content.pending_tab = tab;

        if let Some(handle) = self.record.live_handle(&*host) {
            log::debug!("Switching options window to '{}' tab", tab.fragment());
            host.navigate(&handle, &options_source(tab))?;
            self.record.focus(host);
            return Ok(handle);
        }

        self.record.create(host, &mut self.content)
    }

    pub fn current_tab(&self) -> OptionsTab {
        self.content.pending_tab
    }

    pub fn owns(&self, handle: &WindowHandle) -> bool {
        self.record.owns(handle)
    }

    pub fn live_handle(&mut self, host: &dyn HostRuntime) -> Option<WindowHandle> {
        self.record.live_handle(host)
    }

    pub fn handle_closed(&mut self, handle: &WindowHandle) -> bool {
        self.record.handle_closed(handle)
    }

    pub fn close(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.record.close(host)
    }
}
