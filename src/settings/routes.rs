use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::proxy::ProxyClient;
use crate::routing::{Gate, Host};
use super::{Result, SettingsError};

/// 라우트 테이블 초기화 파일입니다. 확장자가 `.json`이면 JSON, 그 외에는 TOML로 읽습니다.
///
/// ```toml
/// [[hosts]]
/// pattern = "*.example.com"
///
/// [hosts.routes]
/// "/" = "10.0.0.1:80"
/// "/api" = "http://10.0.0.2:9000/v1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

/// 호스트 패턴 하나와 그 경로 라우트 목록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub pattern: String,

    /// 경로 패턴 -> 백엔드 URL
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
}

impl RoutesConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SettingsError::FileError {
            path: path.to_string_lossy().to_string(),
            error: e,
        })?;

        if path.extension().map_or(false, |ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SettingsError::ParseError { source: e })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| SettingsError::JsonError { source: e })
    }

    /// 설정된 모든 `Host`를 생성합니다. 백엔드 URL 하나라도 잘못되면 실패합니다.
    pub fn build_hosts(&self, client: &ProxyClient) -> Result<Vec<(String, Host)>> {
        self.hosts
            .iter()
            .map(|config| {
                let host = Host::with_client(client.clone());
                for (path, backend) in &config.routes {
                    host.map_route(path, backend).map_err(|e| SettingsError::Routing {
                        host: config.pattern.clone(),
                        source: e,
                    })?;
                }
                Ok((config.pattern.clone(), host))
            })
            .collect()
    }

    /// 게이트의 호스트 테이블을 이 설정으로 교체합니다.
    ///
    /// 검증에 실패하면 게이트는 변경되지 않습니다.
    pub fn apply(&self, gate: &Gate, client: &ProxyClient) -> Result<()> {
        let hosts = self.build_hosts(client)?;
        gate.sync_hosts(hosts);
        info!(hosts = self.hosts.len(), routes = self.route_count(), "라우트 설정 적용");
        Ok(())
    }

    pub fn route_count(&self) -> usize {
        self.hosts.iter().map(|host| host.routes.len()).sum()
    }
}
