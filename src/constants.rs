//! # Shared Constants
//!
//! Static configuration for the desktop shell: content URLs, window labels,
//! default window geometry, the two domain allow-lists consumed by the
//! navigation policy, and the zoom step table.
//!
//! The allow-lists are compile-time constants. They are not user-editable at
//! runtime and nothing in the embedded content can widen them.

/// Landing page of the hosted application.
pub const GEMINI_URL: &str = "https://gemini.google.com/app";

/// Identity provider entry point used by the "Sign in" menu item.
pub const SIGN_IN_URL: &str =
    "https://accounts.google.com/ServiceLogin?continue=https://gemini.google.com/app";

/// Local page rendered by the options window. The tab is appended as a fragment.
pub const OPTIONS_URL: &str = "index.html#/options";

/// Local page rendered by the quick chat window.
pub const QUICK_CHAT_URL: &str = "index.html#/quick-chat";

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const OPTIONS_WINDOW_LABEL: &str = "options";
pub const QUICK_CHAT_WINDOW_LABEL: &str = "quick-chat";
/// Auth windows get a unique suffix per sign-in flow.
pub const AUTH_WINDOW_LABEL_PREFIX: &str = "auth";
/// First-party popups opened by the web app; never tracked as a window kind
pub const POPUP_WINDOW_LABEL_PREFIX: &str = "popup";

pub const MAIN_WINDOW_TITLE: &str = "Gemini Desktop";
pub const AUTH_WINDOW_TITLE: &str = "Sign in";
pub const OPTIONS_WINDOW_TITLE: &str = "Options";

pub const MAIN_WINDOW_SIZE: (f64, f64) = (1200.0, 800.0);
pub const MAIN_WINDOW_MIN_SIZE: (f64, f64) = (800.0, 600.0);
pub const AUTH_WINDOW_SIZE: (f64, f64) = (500.0, 700.0);
pub const OPTIONS_WINDOW_SIZE: (f64, f64) = (600.0, 480.0);
pub const QUICK_CHAT_WINDOW_SIZE: (f64, f64) = (600.0, 80.0);

/// Hostnames the hosted application runs under. Exact or dot-suffix match.
pub const FIRST_PARTY_DOMAINS: &[&str] = &["gemini.google.com"];

/// Hostnames belonging to the identity provider. Exact or dot-suffix match.
pub const IDENTITY_PROVIDER_DOMAINS: &[&str] = &[
    "accounts.google.com",
    "accounts.youtube.com",
    "myaccount.google.com",
    "ogs.google.com",
];

/// Hosts that are identity provider territory only under specific paths.
pub const IDENTITY_PROVIDER_PATH_HOSTS: &[&str] = &["google.com", "www.google.com"];

/// Path prefixes that turn an `IDENTITY_PROVIDER_PATH_HOSTS` URL into a sign-in URL.
pub const IDENTITY_PROVIDER_PATH_PREFIXES: &[&str] = &["/gemini/", "/accounts/", "/signin"];

pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// Zoom levels in percent. Stepping moves to the neighbouring entry.
pub const ZOOM_STEPS: &[u32] = &[50, 67, 75, 80, 90, 100, 110, 125, 150, 175, 200];
pub const MIN_ZOOM_LEVEL: u32 = 50;
pub const MAX_ZOOM_LEVEL: u32 = 200;
pub const DEFAULT_ZOOM_LEVEL: u32 = 100;

/// Bridge channel used to hand quick chat text to the main window.
pub const QUICK_CHAT_SUBMIT_CHANNEL: &str = "quick-chat:submit";

/// Content bridge attached to every window before its content loads.
///
/// The bridge only forwards messages to the host; it exposes no privileged APIs.
pub const CONTENT_BRIDGE_SCRIPT: &str = r#"
(function () {
  if (window.__geminiDesktop) { return; }
  const listeners = {};
  window.__geminiDesktop = Object.freeze({
    on(channel, cb) { (listeners[channel] = listeners[channel] || []).push(cb); },
    __dispatch(channel, payload) { (listeners[channel] || []).forEach((cb) => cb(payload)); },
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_https_or_local() {
        assert!(GEMINI_URL.starts_with("https://"));
        assert!(SIGN_IN_URL.starts_with("https://accounts.google.com/"));
        assert!(OPTIONS_URL.starts_with("index.html"));
        assert!(QUICK_CHAT_URL.starts_with("index.html"));
    }

    #[test]
    fn test_zoom_steps_are_sorted_and_bounded() {
        assert!(ZOOM_STEPS.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ZOOM_STEPS.first(), Some(&MIN_ZOOM_LEVEL));
        assert_eq!(ZOOM_STEPS.last(), Some(&MAX_ZOOM_LEVEL));
        assert!(ZOOM_STEPS.contains(&DEFAULT_ZOOM_LEVEL));
    }

    #[test]
    fn test_window_labels_are_distinct() {
        let labels = [
            MAIN_WINDOW_LABEL,
            OPTIONS_WINDOW_LABEL,
            QUICK_CHAT_WINDOW_LABEL,
            AUTH_WINDOW_LABEL_PREFIX,
            POPUP_WINDOW_LABEL_PREFIX,
        ];
        for (i, a) in labels.iter().enumerate() {
            assert!(!a.is_empty());
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
