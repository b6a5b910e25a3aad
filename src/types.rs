use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    AUTH_WINDOW_LABEL_PREFIX, DEFAULT_ZOOM_LEVEL, MAIN_WINDOW_LABEL, MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL,
    OPTIONS_WINDOW_LABEL, POPUP_WINDOW_LABEL_PREFIX, QUICK_CHAT_WINDOW_LABEL, ZOOM_STEPS,
};

/// The four window kinds the shell manages. Fixed for the lifetime of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    Main,
    Auth,
    Options,
    QuickChat,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Main => "main",
            WindowKind::Auth => "auth",
            WindowKind::Options => "options",
            WindowKind::QuickChat => "quick chat",
        }
    }

    /// Kind implied by a native window label, `None` for labels the shell never issues
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            MAIN_WINDOW_LABEL => Some(WindowKind::Main),
            OPTIONS_WINDOW_LABEL => Some(WindowKind::Options),
            QUICK_CHAT_WINDOW_LABEL => Some(WindowKind::QuickChat),
            _ if label.starts_with(&format!("{}-", AUTH_WINDOW_LABEL_PREFIX)) => Some(WindowKind::Auth),
            _ => None,
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a native window, identified by its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Fresh `popup-<uuid>` handle for a first-party popup
    pub fn popup() -> Self {
        Self(format!("{}-{}", POPUP_WINDOW_LABEL_PREFIX, Uuid::new_v4()))
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Logical size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Squared distance from `point` to the closest point of the rectangle (0 when inside).
    pub fn distance_squared_to(&self, point: Point) -> f64 {
        let dx = if point.x < self.x {
            self.x - point.x
        } else if point.x > self.right() {
            point.x - self.right()
        } else {
            0.0
        };
        let dy = if point.y < self.y {
            self.y - point.y
        } else if point.y > self.bottom() {
            point.y - self.bottom()
        } else {
            0.0
        };
        dx * dx + dy * dy
    }
}

/// A connected monitor as reported by the host runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    /// Full monitor bounds
    pub bounds: Rect,
    /// Bounds minus task bars, docks and menu bars
    pub work_area: Rect,
    pub scale_factor: f64,
}

/// Main window geometry persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    /// Window width in logical pixels
    pub width: f64,
    /// Window height in logical pixels
    pub height: f64,
    /// Window X position
    pub x: Option<i32>,
    /// Window Y position
    pub y: Option<i32>,
    /// Whether window is maximized
    pub maximized: bool,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            x: None,
            y: None,
            maximized: false,
        }
    }
}

impl WindowBounds {
    /// Constrain saved bounds so a restored window stays usable and on screen.
    ///
    /// - **Width**: 800px to 2000px
    /// - **Height**: 600px to 1400px
    /// - **Position X**: -100px to 1500px
    /// - **Position Y**: -100px to 1000px
    pub fn validated(&self) -> Self {
        Self {
            width: self.width.clamp(800.0, 2000.0),
            height: self.height.clamp(600.0, 1400.0),
            x: self.x.map(|x| x.clamp(-100, 1500)),
            y: self.y.map(|y| y.clamp(-100, 1000)),
            maximized: self.maximized,
        }
    }
}

/// Zoom level as an integer percentage, always one of `ZOOM_STEPS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoomLevel(u32);

impl ZoomLevel {
    /// Clamp to [50, 200] and snap to the nearest step. Ties snap downward.
    pub fn new(percent: u32) -> Self {
        let clamped = percent.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
        let snapped = ZOOM_STEPS
            .iter()
            .copied()
            .min_by_key(|step| step.abs_diff(clamped))
            .unwrap_or(DEFAULT_ZOOM_LEVEL);
        Self(snapped)
    }

    pub fn percent(&self) -> u32 {
        self.0
    }

    /// Factor handed to the renderer (1.0 == 100%)
    pub fn factor(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn step_in(&self) -> Self {
        ZOOM_STEPS
            .iter()
            .copied()
            .find(|step| *step > self.0)
            .map(Self)
            .unwrap_or(*self)
    }

    pub fn step_out(&self) -> Self {
        ZOOM_STEPS
            .iter()
            .rev()
            .copied()
            .find(|step| *step < self.0)
            .map(Self)
            .unwrap_or(*self)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(DEFAULT_ZOOM_LEVEL)
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Tabs addressable in the options window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionsTab {
    #[default]
    Settings,
    About,
}

impl OptionsTab {
    /// Fragment appended to the options page URL
    pub fn fragment(&self) -> &'static str {
        match self {
            OptionsTab::Settings => "settings",
            OptionsTab::About => "about",
        }
    }
}

impl FromStr for OptionsTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "settings" => Ok(OptionsTab::Settings),
            "about" => Ok(OptionsTab::About),
            other => Err(format!("Unknown options tab: {}", other)),
        }
    }
}
