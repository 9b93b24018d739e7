use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::{Request, Response};
use tracing::{debug, info};

use crate::proxy::{self, ProxyBody, ProxyClient, ReverseProxy};
use crate::routing::error::RoutingError;
use crate::routing::handler::Handler;
use crate::routing::matcher::PathMatcher;
use crate::routing::router::{Matched, Router};

/// 가상 호스트 하나의 경로 라우팅 테이블입니다.
///
/// 경로 접두사 패턴마다 백엔드 프록시 핸들러를 등록하고, 요청 경로와 가장
/// 길게 일치하는 패턴의 핸들러로 요청을 전달합니다.
pub struct Host {
    routes: Router<dyn Handler, PathMatcher>,
    client: ProxyClient,
}

impl Host {
    pub fn new() -> Self {
        Self::with_client(proxy::http_client())
    }

    /// 커넥션 풀을 공유할 클라이언트를 지정해 생성합니다.
    pub fn with_client(client: ProxyClient) -> Self {
        Self {
            routes: Router::new(PathMatcher),
            client,
        }
    }

    /// 경로 패턴을 백엔드 URL로 연결합니다.
    ///
    /// `backend_url`은 `host[:port]` 또는 `http://host[:port][/path]` 형식입니다.
    /// 파싱에 실패하면 아무것도 등록하지 않고 에러를 반환합니다.
    pub fn map_route(&self, pattern: &str, backend_url: &str) -> Result<(), RoutingError> {
        let target = proxy::parse_backend_url(backend_url)?;
        info!(pattern = %pattern, backend = %target, "경로 라우트 등록");
        self.map(pattern, Arc::new(ReverseProxy::new(target, self.client.clone())));
        Ok(())
    }

    /// 임의의 핸들러를 경로 패턴에 등록합니다.
    pub fn map(&self, pattern: &str, handler: Arc<dyn Handler>) {
        self.routes.map(pattern, handler);
    }

    pub fn delete_route(&self, pattern: &str) {
        if self.routes.delete(pattern) {
            info!(pattern = %pattern, "경로 라우트 제거");
        }
    }

    pub fn clear_routes(&self) {
        self.routes.clear();
        info!("경로 라우트 전체 제거");
    }

    /// 요청 경로에 해당하는 핸들러를 찾습니다.
    pub fn find_route(&self, path: &str) -> Option<Arc<dyn Handler>> {
        self.routes.find(path)
    }

    pub fn lookup_route(&self, path: &str) -> Option<Matched<dyn Handler>> {
        self.routes.lookup(path)
    }

    pub fn patterns(&self) -> Vec<String> {
        self.routes.patterns()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("routes", &self.routes.patterns())
            .finish()
    }
}

#[async_trait]
impl Handler for Host {
    async fn serve(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let Some(matched) = self.routes.lookup(req.uri().path()) else {
            debug!(path = %req.uri().path(), "일치하는 경로 라우트 없음");
            return proxy::not_found();
        };

        debug!(path = %req.uri().path(), pattern = %matched.pattern, "경로 라우트 매칭");
        matched.handler.serve(req).await
    }
}
