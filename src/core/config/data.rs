use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:2024";
pub const DEFAULT_ASSISTANT_ID: &str = "agent";
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_DURATION_SECS: u64 = 30;
pub const MAX_DURATION_LIMIT_SECS: u64 = 3600;

/// Settings persisted in `config.toml`. Every field is optional; unset
/// values fall back to the environment and then to built-in defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the orchestration service (e.g. "http://localhost:2024")
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// Graph/assistant executed for every run
    pub assistant_id: Option<String>,
    #[serde(default, skip_serializing_if = "ServerConfig::is_empty")]
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Upper bound on a single relayed run, in seconds
    pub max_duration_secs: Option<u64>,
}

impl ServerConfig {
    pub fn is_empty(&self) -> bool {
        self.bind.is_none() && self.port.is_none() && self.max_duration_secs.is_none()
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/graphchat/config.toml` → `~/.config/graphchat/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
