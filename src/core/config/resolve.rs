use std::time::Duration;

use tracing::warn;

use crate::core::config::data::{
    Config, DEFAULT_API_URL, DEFAULT_ASSISTANT_ID, DEFAULT_BIND, DEFAULT_MAX_DURATION_SECS,
    DEFAULT_PORT, MAX_DURATION_LIMIT_SECS,
};

/// Values from the command line or environment. clap folds the two
/// together, so anything set here beats the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Effective settings after layering overrides, file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub assistant_id: String,
    pub bind: String,
    pub port: u16,
    pub max_duration: Duration,
}

impl ResolvedConfig {
    pub fn resolve(config: &Config, overrides: &Overrides) -> Self {
        fn pick(flag: &Option<String>, file: &Option<String>) -> Option<String> {
            flag.iter()
                .chain(file.iter())
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
                .map(str::to_string)
        }

        Self {
            api_url: pick(&overrides.api_url, &config.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: pick(&overrides.api_key, &config.api_key),
            assistant_id: pick(&overrides.assistant_id, &config.assistant_id)
                .unwrap_or_else(|| DEFAULT_ASSISTANT_ID.to_string()),
            bind: pick(&overrides.bind, &config.server.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides
                .port
                .or(config.server.port)
                .unwrap_or(DEFAULT_PORT),
            max_duration: Duration::from_secs(max_duration_secs(config)),
        }
    }

    /// The API key with all but its last four characters hidden.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_secret)
    }
}

/// The file may have been edited by hand, so out-of-range windows are
/// clamped here as well as rejected by `set`.
fn max_duration_secs(config: &Config) -> u64 {
    match config.server.max_duration_secs {
        None | Some(0) => DEFAULT_MAX_DURATION_SECS,
        Some(secs) if secs > MAX_DURATION_LIMIT_SECS => {
            warn!(
                configured = secs,
                limit = MAX_DURATION_LIMIT_SECS,
                "max_duration_secs is too large; clamping"
            );
            MAX_DURATION_LIMIT_SECS
        }
        Some(secs) => secs,
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
