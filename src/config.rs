use std::collections::HashMap;
use std::env;
use std::fs;
use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:5001";
const DEFAULT_BRIDGE_BIND: &str = "127.0.0.1:5001";
const DEFAULT_TOKEN_FILE: &str = "token.json";
const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_TIME_ZONE: &str = "Asia/Kolkata";

/// Key=value config file layered under the process environment. Supports
/// `export` prefixes, quoted values and `#` comments so a dotenv-style file
/// can be reused as-is.
#[derive(Debug, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
    env_lookup: fn(&str) -> Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            env_lookup: process_env,
        }
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Configuration(format!("cannot read {path}: {e}")))?;
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(AppError::Configuration(format!(
                    "invalid config line {}: {}",
                    idx + 1,
                    line
                )));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
                || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self {
            values,
            env_lookup: process_env,
        })
    }

    /// An already-set environment variable wins over the file, like a
    /// dotenv loader that does not override the environment.
    pub fn get(&self, key: &str) -> Option<String> {
        (self.env_lookup)(key).or_else(|| self.values.get(key).cloned())
    }

    #[cfg(test)]
    fn with_env_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.env_lookup = lookup;
        self
    }
}

/// Settings for the interactive chat mode. Built once at startup and passed
/// into the components that need them; nothing reads the environment later.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub bridge_url: String,
}

impl ChatSettings {
    pub fn load(config: &AppConfig) -> Result<Self, AppError> {
        let gemini_api_key = config.get("GEMINI_API_KEY").ok_or_else(|| {
            AppError::Configuration("GEMINI_API_KEY must be set for chat mode".to_string())
        })?;
        Ok(Self {
            gemini_api_key,
            gemini_model: config
                .get("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            bridge_url: bridge_url(config),
        })
    }
}

/// Settings for the calendar bridge server.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub bind: SocketAddr,
    pub token_file: String,
    pub calendar_id: String,
    pub time_zone: String,
}

impl BridgeSettings {
    pub fn load(config: &AppConfig) -> Result<Self, AppError> {
        let bind_raw = config
            .get("BRIDGE_BIND")
            .unwrap_or_else(|| DEFAULT_BRIDGE_BIND.to_string());
        let bind: SocketAddr = bind_raw.parse().map_err(|e| {
            AppError::Configuration(format!("invalid BRIDGE_BIND '{bind_raw}': {e}"))
        })?;
        Ok(Self {
            bind,
            token_file: config
                .get("CALENDAR_TOKEN_FILE")
                .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string()),
            calendar_id: config
                .get("CALENDAR_ID")
                .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string()),
            time_zone: config
                .get("CALENDAR_TIME_ZONE")
                .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string()),
        })
    }
}

pub fn bridge_url(config: &AppConfig) -> String {
    config
        .get("CALENDAR_BRIDGE_URL")
        .unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_and_quotes() {
        let dir = std::env::temp_dir().join("study_copilot_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.env");
        std::fs::write(
            &path,
            "# comment\nexport GEMINI_API_KEY=\"abc\"\nGEMINI_MODEL='gemini-2.0-flash'\n",
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap())
            .unwrap()
            .with_env_lookup(|_| None);
        assert_eq!(config.get("GEMINI_API_KEY").unwrap(), "abc");
        let settings = ChatSettings::load(&config).unwrap();
        assert_eq!(settings.gemini_model, "gemini-2.0-flash");
        assert_eq!(settings.bridge_url, "http://127.0.0.1:5001");
    }

    #[test]
    fn rejects_malformed_lines() {
        let dir = std::env::temp_dir().join("study_copilot_config_test_bad");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.env");
        std::fs::write(&path, "NOT A KEY VALUE\n").unwrap();
        assert!(AppConfig::from_file(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_gemini_key_fails_chat_settings() {
        let config = AppConfig::default().with_env_lookup(|_| None);
        let err = ChatSettings::load(&config).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn environment_wins_over_file() {
        let dir = std::env::temp_dir().join("study_copilot_config_test_env");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.env");
        std::fs::write(&path, "GEMINI_MODEL=from-file\n").unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap())
            .unwrap()
            .with_env_lookup(|key| (key == "GEMINI_MODEL").then(|| "from-env".to_string()));
        assert_eq!(config.get("GEMINI_MODEL").unwrap(), "from-env");
        assert_eq!(config.get("CALENDAR_ID"), None);
    }
}
