//! Platform-dependent behaviour, resolved once at startup and injected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    MacOs,
    Windows,
    Linux,
}

impl Os {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Linux
        }
    }
}

/// Shape of the native application menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuShape {
    /// Leading submenu named after the app holding About / Settings / Quit
    AppMenu,
    /// Settings and Quit under File, About under Help
    FileMenu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformPolicy {
    pub os: Os,
    /// Convert a user close of the main window into hide-to-tray
    pub close_to_tray: bool,
    /// Remove the main window from the taskbar while it sits in the tray
    pub skip_taskbar_when_hidden: bool,
    pub menu_shape: MenuShape,
}

impl PlatformPolicy {
    pub fn current() -> Self {
        Self::for_os(Os::current())
    }

    pub fn for_os(os: Os) -> Self {
        match os {
            Os::MacOs => Self {
                os,
                close_to_tray: true,
                skip_taskbar_when_hidden: false,
                menu_shape: MenuShape::AppMenu,
            },
            Os::Windows | Os::Linux => Self {
                os,
                close_to_tray: true,
                skip_taskbar_when_hidden: true,
                menu_shape: MenuShape::FileMenu,
            },
        }
    }

    /// Variant for environments without a system tray: closing really closes.
    pub fn without_tray(mut self) -> Self {
        self.close_to_tray = false;
        self
    }
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macos_keeps_taskbar_entry() {
        let policy = PlatformPolicy::for_os(Os::MacOs);
        assert!(policy.close_to_tray);
        assert!(!policy.skip_taskbar_when_hidden);
        assert_eq!(policy.menu_shape, MenuShape::AppMenu);
    }

    #[test]
    fn test_windows_and_linux_skip_taskbar() {
        for os in [Os::Windows, Os::Linux] {
            let policy = PlatformPolicy::for_os(os);
            assert!(policy.skip_taskbar_when_hidden);
            assert_eq!(policy.menu_shape, MenuShape::FileMenu);
        }
    }

    #[test]
    fn test_without_tray() {
        let policy = PlatformPolicy::for_os(Os::Linux).without_tray();
        assert!(!policy.close_to_tray);
    }
}
