//! # Navigation Policy
//!
//! Pure classification of navigation targets into trust tiers, plus the
//! decision tables the windows apply on top of that classification.
//!
//! ## Classification Rules
//!
//! Evaluated in order, first match wins:
//! 1. Unparseable URL, or a non-`file:` URL without a host → `Invalid`
//! 2. `file:` scheme → `LocalFile`
//! 3. `localhost` / `127.0.0.1` → `Loopback`
//! 4. First-party domain (exact or dot-suffix) → `Internal`
//! 5. Identity provider domain, or an identity path on `google.com` → `IdentityProvider`
//! 6. Anything else → `External`
//!
//! ## Consequences
//!
//! | Classification | Same-window navigation | New-window request |
//! |---|---|---|
//! | `Invalid` | cancel | deny |
//! | `LocalFile` / `Loopback` | allow | external browser if http(s), else deny |
//! | `Internal` | allow | allow |
//! | `IdentityProvider` | allow | deny, open auth window |
//! | `External` | cancel | external browser if http(s), else deny |
//!
//! Nothing in this module has side effects. Windows consult it from their
//! event handlers and perform the logging and host calls themselves.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    FIRST_PARTY_DOMAINS, IDENTITY_PROVIDER_DOMAINS, IDENTITY_PROVIDER_PATH_HOSTS,
    IDENTITY_PROVIDER_PATH_PREFIXES, LOOPBACK_HOSTS,
};

static DEFAULT_POLICY: Lazy<DomainPolicy> = Lazy::new(DomainPolicy::default);

/// Trust tier of a navigation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainClassification {
    LocalFile,
    Loopback,
    Internal,
    IdentityProvider,
    External,
    Invalid,
}

impl DomainClassification {
    /// Whether the primary window may navigate in place to this target
    pub fn allows_in_place_navigation(&self) -> bool {
        matches!(
            self,
            DomainClassification::LocalFile
                | DomainClassification::Loopback
                | DomainClassification::Internal
                | DomainClassification::IdentityProvider
        )
    }
}

/// Outcome of a same-window navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Cancel,
}

/// Outcome of a `window.open` / `target=_blank` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupDecision {
    /// Let the runtime create a new embedding window
    Allow,
    /// Drop the request
    Deny,
    /// Deny the popup and run the flow in the auth window instead
    OpenInAuthWindow(String),
    /// Deny the popup and hand the URL to the system browser
    OpenExternally(String),
}

/// The two static allow-lists the shell trusts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    first_party: Vec<String>,
    identity_providers: Vec<String>,
    identity_path_hosts: Vec<String>,
    identity_path_prefixes: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::new(FIRST_PARTY_DOMAINS, IDENTITY_PROVIDER_DOMAINS).with_identity_paths(
            IDENTITY_PROVIDER_PATH_HOSTS,
            IDENTITY_PROVIDER_PATH_PREFIXES,
        )
    }
}

impl DomainPolicy {
    pub fn new(first_party: &[&str], identity_providers: &[&str]) -> Self {
        Self {
            first_party: normalize_domains(first_party),
            identity_providers: normalize_domains(identity_providers),
            identity_path_hosts: Vec::new(),
            identity_path_prefixes: Vec::new(),
        }
    }

    /// Treat `hosts` as identity provider territory when the path starts with one of `prefixes`.
    pub fn with_identity_paths(mut self, hosts: &[&str], prefixes: &[&str]) -> Self {
        self.identity_path_hosts = normalize_domains(hosts);
        self.identity_path_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn classify(&self, url: &str) -> DomainClassification {
        match Url::parse(url.trim()) {
            Ok(parsed) => self.classify_url(&parsed),
            Err(_) => DomainClassification::Invalid,
        }
    }

    pub fn classify_url(&self, url: &Url) -> DomainClassification {
        if url.scheme() == "file" {
            return DomainClassification::LocalFile;
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.trim_end_matches('.').to_ascii_lowercase(),
            _ => return DomainClassification::Invalid,
        };

        if LOOPBACK_HOSTS.contains(&host.as_str()) {
            return DomainClassification::Loopback;
        }

        if self.first_party.iter().any(|d| domain_matches(&host, d)) {
            return DomainClassification::Internal;
        }

        if self.identity_providers.iter().any(|d| domain_matches(&host, d)) {
            return DomainClassification::IdentityProvider;
        }

        if self.identity_path_hosts.iter().any(|h| *h == host)
            && self
                .identity_path_prefixes
                .iter()
                .any(|prefix| url.path().starts_with(prefix.as_str()))
        {
            return DomainClassification::IdentityProvider;
        }

        DomainClassification::External
    }

    /// Decision for a same-window navigation in the primary window
    pub fn navigation_decision(&self, url: &str) -> NavigationDecision {
        if self.classify(url).allows_in_place_navigation() {
            NavigationDecision::Allow
        } else {
            NavigationDecision::Cancel
        }
    }

    /// Decision for a new-window request raised by primary window content
    pub fn popup_decision(&self, url: &str) -> PopupDecision {
        match self.classify(url) {
            DomainClassification::Invalid => PopupDecision::Deny,
            DomainClassification::IdentityProvider => PopupDecision::OpenInAuthWindow(url.to_string()),
            DomainClassification::Internal => PopupDecision::Allow,
            DomainClassification::External
            | DomainClassification::Loopback
            | DomainClassification::LocalFile => {
                if is_browser_scheme(url) {
                    PopupDecision::OpenExternally(url.to_string())
                } else {
                    PopupDecision::Deny
                }
            }
        }
    }

    /// Whether an auth window that just navigated to `url` has finished its flow
    pub fn completes_sign_in(&self, url: &str) -> bool {
        self.classify(url) == DomainClassification::Internal
    }
}

/// Classify `url` against the built-in allow-lists.
pub fn classify(url: &str) -> DomainClassification {
    DEFAULT_POLICY.classify(url)
}

/// The shared built-in policy
pub fn default_policy() -> &'static DomainPolicy {
    &DEFAULT_POLICY
}

/// Only http(s) URLs are ever handed to the system browser.
pub fn is_browser_scheme(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn normalize_domains(domains: &[&str]) -> Vec<String> {
    domains
        .iter()
        .map(|d| d.trim().trim_start_matches("*.").trim_end_matches('.').to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}
