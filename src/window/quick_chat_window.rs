//! # Quick Chat Window
//!
//! Frameless, transparent, always-on-top input bar that stays out of the
//! taskbar. It is created hidden and repositioned on every show:
//!
//! 1. Find the display under the pointer, or the nearest one if the pointer
//!    sits outside every display.
//! 2. Center horizontally in that display's work area.
//! 3. Place the top edge a quarter of the way down the work area.
//! 4. Clamp so the whole window stays inside the work area.
//!
//! Losing focus hides the window. `is_ready` only turns true after the first
//! content load finishes.

use crate::constants::{QUICK_CHAT_URL, QUICK_CHAT_WINDOW_LABEL, QUICK_CHAT_WINDOW_SIZE};
use crate::errors::WindowResult;
use crate::host::{ContentSource, HostRuntime, WindowConfig};
use crate::types::{Display, Point, Size, WindowHandle, WindowKind};
use crate::window::lifecycle::{WindowContent, WindowRecord};

/// Display containing `cursor`, falling back to the closest one
pub fn nearest_display(displays: &[Display], cursor: Point) -> Option<&Display> {
    displays
        .iter()
        .find(|d| d.bounds.contains(cursor))
        .or_else(|| {
            displays.iter().min_by(|a, b| {
                a.bounds
                    .distance_squared_to(cursor)
                    .total_cmp(&b.bounds.distance_squared_to(cursor))
            })
        })
}

/// Top-left corner for a window of `size` on the display nearest `cursor`
pub fn compute_position(displays: &[Display], cursor: Point, size: Size) -> Option<Point> {
    let work_area = nearest_display(displays, cursor)?.work_area;

    let x = work_area.x + (work_area.width - size.width) / 2.0;
    let y = work_area.y + work_area.height / 4.0;

    // Oversized windows pin to the top-left of the work area
    let max_x = (work_area.right() - size.width).max(work_area.x);
    let max_y = (work_area.bottom() - size.height).max(work_area.y);

    Some(Point::new(
        x.clamp(work_area.x, max_x).round(),
        y.clamp(work_area.y, max_y).round(),
    ))
}

#[derive(Debug, Clone, Default)]
struct QuickChatContent;

impl WindowContent for QuickChatContent {
    fn kind(&self) -> WindowKind {
        WindowKind::QuickChat
    }

    fn config(&self) -> WindowConfig {
        let mut config = WindowConfig::new(
            QUICK_CHAT_WINDOW_LABEL,
            WindowKind::QuickChat,
            "",
            Size::new(QUICK_CHAT_WINDOW_SIZE.0, QUICK_CHAT_WINDOW_SIZE.1),
        );
        config.resizable = false;
        config.decorations = false;
        config.transparent = true;
        config.always_on_top = true;
        config.skip_taskbar = true;
        config.visible = false;
        config
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::App(QUICK_CHAT_URL.to_string())
    }
}

#[derive(Debug)]
pub struct QuickChatWindow {
    record: WindowRecord,
    content: QuickChatContent,
    ready: bool,
}

impl Default for QuickChatWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl QuickChatWindow {
    pub fn new() -> Self {
        Self {
            record: WindowRecord::new(WindowKind::QuickChat),
            content: QuickChatContent,
            ready: false,
        }
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

    /// True once the first content load has finished
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Create if needed, move next to the pointer and show focused
    pub fn show(&mut self, host: &mut dyn HostRuntime) -> WindowResult<WindowHandle> {
        let handle = self.record.create(host, &mut self.content)?;

        match self.position_for(&*host) {
            Ok(Some(position)) => {
                if let Err(e) = host.set_position(&handle, position) {
                    log::warn!("⚠️ Failed to position quick chat window: {}", e);
                }
            }
            Ok(None) => log::warn!("⚠️ No displays reported, showing quick chat in place"),
            Err(e) => log::warn!("⚠️ Could not compute quick chat position: {}", e),
        }

        self.record.show(host);
        self.record.focus(host);
        Ok(handle)
    }

    pub fn hide(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.record.hide(host)
    }

    pub fn close(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.record.close(host)
    }

    /// Visible → hide, hidden or absent → show. Returns the new visibility.
    pub fn toggle(&mut self, host: &mut dyn HostRuntime) -> WindowResult<bool> {
        if self.record.is_visible(&*host) {
            self.hide(host);
            Ok(false)
        } else {
            self.show(host)?;
            Ok(true)
        }
    }

    pub fn handle_focus_changed(&mut self, host: &mut dyn HostRuntime, focused: bool) {
        if !focused && self.record.is_visible(&*host) {
            log::debug!("Quick chat lost focus, hiding");
            self.hide(host);
        }
    }

    pub fn handle_content_loaded(&mut self) {
        if !self.ready {
            log::info!("⚡ Quick chat window ready");
        }
        self.ready = true;
    }

    pub fn handle_closed(&mut self, handle: &WindowHandle) -> bool {
        let closed = self.record.handle_closed(handle);
        if closed {
            self.ready = false;
        }
        closed
    }

    fn position_for(&self, host: &dyn HostRuntime) -> WindowResult<Option<Point>> {
        let cursor = host.cursor_position()?;
        let displays = host.displays()?;
        Ok(compute_position(
            &displays,
            cursor,
            Size::new(QUICK_CHAT_WINDOW_SIZE.0, QUICK_CHAT_WINDOW_SIZE.1),
        ))
    }
}
