use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::proxy::{self, ProxyClient};
use crate::routing::Gate;
use crate::settings::{ConfigEvent, ConfigWatcher, RoutesConfig, Settings};
use super::handler::RequestHandler;
use super::listener::ServerListener;
use super::Result;

/// 게이트, 라우트 파일 감시, 리스너를 묶어 실행합니다.
pub struct ServerManager {
    pub config: Settings,
    gate: Arc<Gate>,
    client: ProxyClient,
}

impl ServerManager {
    /// 설정으로부터 게이트를 만들고 라우트 파일이 있으면 적용합니다.
    #[instrument(skip(config), level = "debug", err)]
    pub fn new(config: Settings) -> Result<Self> {
        let gate = Arc::new(Gate::new());
        let client = proxy::http_client();

        if let Some(path) = &config.routes_file {
            let count = reload_routes(path, &gate, &client)?;
            info!(path = %path.display(), routes = count, "초기 라우트 로드");
        } else {
            warn!("라우트 파일이 설정되지 않음, 빈 라우팅 테이블로 시작");
        }

        Ok(Self { config, gate, client })
    }

    pub fn gate(&self) -> Arc<Gate> {
        self.gate.clone()
    }

    /// 리스너를 실행합니다. Ctrl-C를 받으면 정상 종료합니다.
    #[instrument(skip(self), level = "info", err)]
    pub async fn run(self) -> Result<()> {
        let _watch_task = match (&self.config.routes_file, self.config.watch_routes) {
            (Some(path), true) => {
                let mut watcher = ConfigWatcher::new(path.clone());
                watcher.start()?;
                Some(tokio::spawn(watch_routes(watcher, self.gate.clone(), self.client.clone())))
            }
            _ => None,
        };

        let listener = ServerListener::bind(&self.config.server).await?;
        let handler = Arc::new(RequestHandler::new(self.gate.clone()));

        tokio::select! {
            result = listener.run(handler) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("종료 신호 수신");
                Ok(())
            }
        }
    }
}

/// 라우트 파일을 읽어 게이트에 적용하고 적용된 경로 라우트 수를 반환합니다.
///
/// 파일이 잘못되었으면 기존 라우팅 테이블을 유지합니다.
pub fn reload_routes(path: &Path, gate: &Gate, client: &ProxyClient) -> crate::settings::Result<usize> {
    let routes = RoutesConfig::from_file(path)?;
    routes.apply(gate, client)?;
    Ok(routes.route_count())
}

async fn watch_routes(mut watcher: ConfigWatcher, gate: Arc<Gate>, client: ProxyClient) {
    while let Some(event) = watcher.watch().await {
        match event {
            ConfigEvent::Created(path) | ConfigEvent::Modified(path) => {
                match reload_routes(&path, &gate, &client) {
                    Ok(count) => info!(path = %path.display(), routes = count, "라우트 파일 재적용"),
                    Err(e) => error!(error = %e, path = %path.display(), "라우트 파일 재적용 실패, 기존 테이블 유지"),
                }
            }
            ConfigEvent::Deleted(path) => {
                warn!(path = %path.display(), "라우트 파일 삭제됨, 기존 테이블 유지");
            }
        }
    }
    warn!("라우트 파일 감시 종료");
}
