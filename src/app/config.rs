//! Runtime configuration for the portal API and the local session file. Values
//! come from command-line flags or their `MCC_*` environment fallbacks and are
//! applied on top of the defaults. Configuration values are not secret; do not
//! put credentials here.

use std::path::PathBuf;
use std::time::Duration;

/// Relative placeholder the portal ships with when no API host is configured.
pub const PLACEHOLDER_API_BASE_URL: &str = "/api";
/// Default request timeout applied to all API calls.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

const SESSION_DIR: &str = "mcc-admin";
const SESSION_FILE: &str = "session.json";

/// Client configuration shared by the auth backend and the content client.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: PLACEHOLDER_API_BASE_URL.to_string(),
            session_file: default_session_file(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            demo: false,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_file = path;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Demo mode is on when requested, or when no real API host is configured.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.demo || is_placeholder_base_url(&self.api_base_url)
    }
}

/// Optional values collected from flags/env; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub session_file: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub demo: bool,
}

pub fn apply_overrides(config: &mut AppConfig, overrides: ConfigOverrides) {
    if let Some(value) = overrides.api_base_url.as_deref().and_then(normalize_value) {
        config.api_base_url = value;
    }
    if let Some(value) = overrides.session_file.as_deref().and_then(normalize_value) {
        config.session_file = PathBuf::from(value);
    }
    if let Some(seconds) = overrides.timeout_seconds.filter(|seconds| *seconds > 0) {
        config.request_timeout = Duration::from_secs(seconds);
    }
    if overrides.demo {
        config.demo = true;
    }
}

/// Platform data dir when available, otherwise a dot-directory in the cwd.
#[must_use]
pub fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(SESSION_DIR))
        .unwrap_or_else(|| PathBuf::from(format!(".{SESSION_DIR}")))
        .join(SESSION_FILE)
}

fn is_placeholder_base_url(base_url: &str) -> bool {
    let trimmed = base_url.trim().trim_end_matches('/');
    trimmed.is_empty() || trimmed == PLACEHOLDER_API_BASE_URL
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
