use std::{env, fs, path::{Path, PathBuf}};
use serde::Deserialize;

mod server;
pub mod logging;
mod error;
mod routes;
pub mod watcher;

pub use server::{parse_env_var, ServerSettings};
pub use logging::LogSettings;
pub use error::SettingsError;
pub use routes::{HostConfig, RoutesConfig};
pub use watcher::{ConfigEvent, ConfigWatcher};

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// 라우트 테이블 초기화 파일 (TOML 또는 JSON)
    #[serde(default)]
    pub routes_file: Option<PathBuf>,

    /// 라우트 파일 변경 시 자동 재적용 여부
    #[serde(default = "default_watch_routes")]
    pub watch_routes: bool,
}

fn default_watch_routes() -> bool { true }

impl Settings {
    /// `PROXY_CONFIG_FILE`이 있으면 TOML 파일에서, 없으면 환경 변수에서 읽습니다.
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("PROXY_CONFIG_FILE") {
            Self::from_toml_file(&config_path)
        } else {
            Self::from_env()
        }
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        let mut settings: Self = toml::from_str(&content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        // 상대 경로의 라우트 파일은 설정 파일 기준으로 해석
        if let (Some(routes_file), Some(base)) = (&settings.routes_file, path.as_ref().parent()) {
            if routes_file.is_relative() {
                settings.routes_file = Some(base.join(routes_file));
            }
        }

        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            routes_file: env::var("PROXY_ROUTES_FILE").ok().map(PathBuf::from),
            watch_routes: parse_env_var("PROXY_WATCH_ROUTES", default_watch_routes)?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            logging: LogSettings::default(),
            routes_file: None,
            watch_routes: default_watch_routes(),
        }
    }
}
