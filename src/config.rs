//! Console configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const STATE_DIR_NAME: &str = "admin-console";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No state directory override was given and none could be derived from the platform.
    #[error("cannot determine a state directory; set ADMIN_STATE_DIR")]
    MissingStateDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

impl HttpTimeouts {
    /// Read `ADMIN_REQUEST_TIMEOUT_SECS` / `ADMIN_CONNECT_TIMEOUT_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            request_secs: env_parse_u64("ADMIN_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ADMIN_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend API root; gateway paths are appended to it.
    pub api_url: String,
    /// Directory holding the durable session snapshot and cookies.
    pub state_dir: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl ConsoleConfig {
    /// Build a config for `api_url` with default timeouts.
    #[must_use]
    pub fn new(api_url: &str, state_dir: PathBuf) -> Self {
        Self { api_url: normalize_api_url(api_url), state_dir, timeouts: HttpTimeouts::default() }
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build typed console config from environment variables.
    ///
    /// Optional:
    /// - `ADMIN_API_URL`: default `http://localhost:8000/api`
    /// - `ADMIN_STATE_DIR`: default `<platform state dir>/admin-console`
    /// - `ADMIN_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ADMIN_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStateDir`] when no state directory can be resolved.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("ADMIN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let state_dir = match std::env::var_os("ADMIN_STATE_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_state_dir()?,
        };
        Ok(Self { api_url: normalize_api_url(&api_url), state_dir, timeouts: HttpTimeouts::from_env() })
    }
}

/// Platform state directory for the console (`~/.local/state/admin-console` on Linux).
///
/// # Errors
///
/// Returns [`ConfigError::MissingStateDir`] if neither a state nor a home directory is known.
pub fn default_state_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .ok_or(ConfigError::MissingStateDir)?;
    Ok(base.join(STATE_DIR_NAME))
}

fn normalize_api_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
