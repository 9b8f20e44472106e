use crate::core::config::data::{Config, MAX_DURATION_LIMIT_SECS};
use crate::core::config::io::ConfigError;

/// Keys accepted by `graphchat set` / `graphchat unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiUrl,
    ApiKey,
    AssistantId,
    ServerBind,
    ServerPort,
    MaxDuration,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::ApiUrl,
        ConfigKey::ApiKey,
        ConfigKey::AssistantId,
        ConfigKey::ServerBind,
        ConfigKey::ServerPort,
        ConfigKey::MaxDuration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::ApiUrl => "api-url",
            ConfigKey::ApiKey => "api-key",
            ConfigKey::AssistantId => "assistant-id",
            ConfigKey::ServerBind => "server-bind",
            ConfigKey::ServerPort => "server-port",
            ConfigKey::MaxDuration => "max-duration",
        }
    }

    pub fn parse(key: &str) -> Result<Self, ConfigError> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }
}

impl Config {
    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: key.as_str().to_string(),
                reason: "value must not be empty".to_string(),
            });
        }

        match key {
            ConfigKey::ApiUrl => self.api_url = Some(value.to_string()),
            ConfigKey::ApiKey => self.api_key = Some(value.to_string()),
            ConfigKey::AssistantId => self.assistant_id = Some(value.to_string()),
            ConfigKey::ServerBind => self.server.bind = Some(value.to_string()),
            ConfigKey::ServerPort => self.server.port = Some(parse_number(key, value)?),
            ConfigKey::MaxDuration => {
                let secs: u64 = parse_number(key, value)?;
                if !(1..=MAX_DURATION_LIMIT_SECS).contains(&secs) {
                    return Err(ConfigError::InvalidValue {
                        key: key.as_str().to_string(),
                        reason: format!(
                            "must be between 1 and {MAX_DURATION_LIMIT_SECS} seconds"
                        ),
                    });
                }
                self.server.max_duration_secs = Some(secs);
            }
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::ApiUrl => self.api_url = None,
            ConfigKey::ApiKey => self.api_key = None,
            ConfigKey::AssistantId => self.assistant_id = None,
            ConfigKey::ServerBind => self.server.bind = None,
            ConfigKey::ServerPort => self.server.port = None,
            ConfigKey::MaxDuration => self.server.max_duration_secs = None,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: ConfigKey, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        key: key.as_str().to_string(),
        reason: err.to_string(),
    })
}
