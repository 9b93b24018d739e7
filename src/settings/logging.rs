use serde::{Deserialize, Deserializer};
use std::env;
use tracing::Level;
use super::{server::parse_env_var, SettingsError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 로그 출력 대상. `"stdout"` 외의 값은 파일 경로로 취급합니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum LogOutput {
    #[default]
    Stdout,
    File(String),
}

impl From<String> for LogOutput {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("stdout") {
            LogOutput::Stdout
        } else {
            LogOutput::File(value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_level", deserialize_with = "deserialize_level")]
    pub level: Level,
    #[serde(default)]
    pub output: LogOutput,
}

impl LogSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let level = env::var("PROXY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let level = parse_log_level(&level).ok_or_else(|| SettingsError::EnvVarInvalid {
            var_name: "PROXY_LOG_LEVEL".to_string(),
            value: level.clone(),
            reason: "유효하지 않은 로그 레벨".to_string(),
        })?;

        Ok(Self {
            format: parse_env_var("PROXY_LOG_FORMAT", LogFormat::default)?,
            level,
            output: env::var("PROXY_LOG_OUTPUT").map(LogOutput::from).unwrap_or_default(),
        })
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
            output: LogOutput::default(),
        }
    }
}

fn default_level() -> Level {
    Level::INFO
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let level = String::deserialize(deserializer)?;
    parse_log_level(&level)
        .ok_or_else(|| serde::de::Error::custom(format!("유효하지 않은 로그 레벨: {}", level)))
}
