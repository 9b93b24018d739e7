use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::{header, Request, Response};
use tracing::{debug, info};

use crate::proxy::{self, ProxyBody};
use crate::routing::handler::Handler;
use crate::routing::host::Host;
use crate::routing::matcher::HostMatcher;
use crate::routing::router::Router;

/// 가상 호스트 기준의 최상위 라우터입니다.
///
/// 요청의 호스트와 가장 구체적으로 일치하는 호스트 패턴을 고르고, 그
/// 패턴에 등록된 [`Host`]에 요청 처리를 위임합니다. 각 `Host`는 자신을
/// 등록한 항목이 소유하며, 항목을 지우면 함께 해제됩니다.
pub struct Gate {
    hosts: Router<Host, HostMatcher>,
}

impl Gate {
    pub fn new() -> Self {
        Self::with_matcher(HostMatcher::default())
    }

    pub fn with_matcher(matcher: HostMatcher) -> Self {
        Self {
            hosts: Router::new(matcher),
        }
    }

    /// 호스트 패턴에 경로 라우터를 등록합니다. 같은 패턴이 있으면 교체합니다.
    pub fn map_host(&self, pattern: &str, host: Host) {
        info!(pattern = %pattern, routes = host.len(), "호스트 등록");
        self.hosts.map(pattern, Arc::new(host));
    }

    pub fn delete_host(&self, pattern: &str) {
        if self.hosts.delete(pattern) {
            info!(pattern = %pattern, "호스트 제거");
        }
    }

    pub fn clear_hosts(&self) {
        self.hosts.clear();
        info!("호스트 전체 제거");
    }

    /// 호스트 테이블 전체를 원자적으로 교체합니다.
    pub fn sync_hosts(&self, hosts: Vec<(String, Host)>) {
        let count = hosts.len();
        self.hosts.sync(
            hosts
                .into_iter()
                .map(|(pattern, host)| (pattern, Arc::new(host))),
        );
        info!(hosts = count, "호스트 테이블 교체");
    }

    /// 패턴으로 등록된 `Host`를 가져옵니다. 경로 라우트 추가/삭제에 사용합니다.
    pub fn host(&self, pattern: &str) -> Option<Arc<Host>> {
        self.hosts.get(pattern)
    }

    /// 호스트 문자열과 가장 잘 매칭되는 `Host`를 찾습니다.
    pub fn find_host(&self, host: &str) -> Option<Arc<Host>> {
        self.hosts.find(host)
    }

    /// 요청이 최종적으로 전달될 핸들러를 찾습니다.
    pub fn resolve<B>(&self, req: &Request<B>) -> Option<Arc<dyn Handler>> {
        self.find_host(request_host(req))?
            .find_route(req.uri().path())
    }

    pub fn patterns(&self) -> Vec<String> {
        self.hosts.patterns()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("hosts", &self.hosts)
            .finish()
    }
}

#[async_trait]
impl Handler for Gate {
    async fn serve(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let host = request_host(&req);
        let Some(matched) = self.hosts.lookup(host) else {
            debug!(host = %host, "일치하는 호스트 없음");
            return proxy::not_found();
        };

        debug!(host = %host, pattern = %matched.pattern, "호스트 매칭");
        matched.handler.serve(req).await
    }
}

/// 요청의 호스트를 추출합니다.
///
/// `Host` 헤더를 우선 사용하고, 없으면 URI의 authority를 사용합니다.
/// 둘 다 없으면 빈 문자열이며 `*` 패턴만 매칭됩니다.
pub fn request_host<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().authority().map(|authority| authority.as_str()))
        .unwrap_or_default()
}
