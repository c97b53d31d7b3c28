//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const TOKEN_FILE_NAME: &str = "token.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    pub timeouts: Timeouts,
    /// Durable location of the auth token.
    pub token_file: PathBuf,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `JOBBOARD_API_URL`: default `http://localhost:8080/api`
    /// - `JOBBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `JOBBOARD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `JOBBOARD_TOKEN_FILE`: default `<config dir>/jobboard/token.json`
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("JOBBOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("JOBBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("JOBBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let token_file = std::env::var("JOBBOARD_TOKEN_FILE")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(default_token_file, PathBuf::from);

        Self { base_url: normalize_base_url(&base_url), timeouts, token_file }
    }

    /// Config pointing at `base_url` with default timeouts and token location.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url), timeouts: Timeouts::default(), token_file: default_token_file() }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn default_token_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jobboard")
        .join(TOKEN_FILE_NAME)
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
