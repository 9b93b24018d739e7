use std::fmt;

use crate::routing::RoutingError;

#[derive(Debug)]
pub enum SettingsError {
    EnvVarInvalid {
        var_name: String,
        value: String,
        reason: String,
    },
    FileError {
        path: String,
        error: std::io::Error,
    },
    ParseError {
        source: toml::de::Error,
    },
    JsonError {
        source: serde_json::Error,
    },
    /// 라우트 파일에 잘못된 백엔드가 포함됨
    Routing {
        host: String,
        source: RoutingError,
    },
    WatchError(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVarInvalid { var_name, value, reason } =>
                write!(f, "환경 변수 {} 값 {} 오류: {}", var_name, value, reason),
            Self::FileError { path, error } =>
                write!(f, "설정 파일 {} 오류: {}", path, error),
            Self::ParseError { source } =>
                write!(f, "설정 파싱 오류: {}", source),
            Self::JsonError { source } =>
                write!(f, "JSON 설정 파싱 오류: {}", source),
            Self::Routing { host, source } =>
                write!(f, "호스트 {} 라우트 오류: {}", host, source),
            Self::WatchError(message) =>
                write!(f, "설정 파일 감시 오류: {}", message),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError { source } => Some(source),
            Self::JsonError { source } => Some(source),
            Self::FileError { error, .. } => Some(error),
            Self::Routing { source, .. } => Some(source),
            _ => None,
        }
    }
}
