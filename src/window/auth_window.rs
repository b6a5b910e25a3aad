//! # Auth Window
//!
//! Disposable window for identity provider sign-in flows. It shares the
//! session store with the main window, so cookies set during sign-in are
//! visible there as soon as the flow returns.
//!
//! - At most one flow at a time: `create` closes any previous auth window.
//! - Each flow gets a fresh `auth-<uuid>` label.
//! - Sign-in success is inferred from navigation reaching first-party territory,
//!   at which point the window closes itself.
//! - Certificate errors are always rejected.

use uuid::Uuid;

use crate::constants::{AUTH_WINDOW_LABEL_PREFIX, AUTH_WINDOW_SIZE, AUTH_WINDOW_TITLE};
use crate::errors::{WindowError, WindowResult};
use crate::host::{ContentSource, EventResponse, HostRuntime, WindowConfig};
use crate::navigation::{DomainClassification, DomainPolicy};
use crate::types::{Size, WindowHandle, WindowKind};
use crate::window::lifecycle::{WindowContent, WindowRecord};

#[derive(Debug, Clone)]
struct AuthContent {
    label: String,
    url: String,
}

impl WindowContent for AuthContent {
    fn kind(&self) -> WindowKind {
        WindowKind::Auth
    }

    fn config(&self) -> WindowConfig {
        let mut config = WindowConfig::new(
            self.label.clone(),
            WindowKind::Auth,
            AUTH_WINDOW_TITLE,
            Size::new(AUTH_WINDOW_SIZE.0, AUTH_WINDOW_SIZE.1),
        );
        config.resizable = false;
        config
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::Remote(self.url.clone())
    }
}

#[derive(Debug)]
pub struct AuthWindow {
    record: WindowRecord,
    content: Option<AuthContent>,
    policy: DomainPolicy,
    completed_flows: u32,
}

impl AuthWindow {
    pub fn new(policy: DomainPolicy) -> Self {
        Self {
            record: WindowRecord::new(WindowKind::Auth),
            content: None,
            policy,
            completed_flows: 0,
        }
    }

    /// Start a sign-in flow at `url`, replacing any flow in progress
    pub fn create(&mut self, host: &mut dyn HostRuntime, url: &str) -> WindowResult<WindowHandle> {
        if url::Url::parse(url).is_err() {
            return Err(WindowError::InvalidUrl { url: url.to_string() });
        }

        if self.record.is_live(&*host) {
            log::info!("🔐 Replacing auth window with a new sign-in flow");
            self.record.close(host);
        }

        let content = self.content.insert(AuthContent {
            label: format!("{}-{}", AUTH_WINDOW_LABEL_PREFIX, Uuid::new_v4()),
            url: url.to_string(),
        });
        self.record.create(host, content)
    }

    pub fn owns(&self, handle: &WindowHandle) -> bool {
        self.record.owns(handle)
    }

    pub fn live_handle(&mut self, host: &dyn HostRuntime) -> Option<WindowHandle> {
        self.record.live_handle(host)
    }

    /// URL the current flow started at
    pub fn start_url(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.url.as_str())
    }

    pub fn completed_flows(&self) -> u32 {
        self.completed_flows
    }

    /// Reclassify every navigation; landing on a first-party page ends the flow.
    pub fn handle_will_navigate(&mut self, host: &mut dyn HostRuntime, url: &str) -> EventResponse {
        match self.policy.classify(url) {
            DomainClassification::Invalid => {
                log::warn!("🚫 Blocked auth window navigation to invalid URL: {}", url);
                EventResponse::PreventDefault
            }
            DomainClassification::Internal => {
                log::info!("✅ Sign-in flow returned to {}, closing auth window", url);
                if self.record.close(host) {
                    self.completed_flows += 1;
                }
                EventResponse::Continue
            }
            _ => EventResponse::Continue,
        }
    }

    pub fn handle_certificate_error(&self, url: &str) -> EventResponse {
        log::warn!("🔒 Rejecting certificate error in auth window for {}", url);
        EventResponse::Certificate { trusted: false }
    }

    pub fn handle_load_failed(&self, url: &str, code: i32, description: &str) {
        log::warn!(
            "⚠️ Auth window failed to load {} ({}: {}), leaving it open",
            url,
            code,
            description
        );
    }

    pub fn handle_closed(&mut self, handle: &WindowHandle) -> bool {
        self.record.handle_closed(handle)
    }

    pub fn close(&mut self, host: &mut dyn HostRuntime) -> bool {
        self.record.close(host)
    }
}
