//! 단일 백엔드로 요청을 전달하는 리버스 프록시 핸들러입니다.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Request, Response, StatusCode, Uri, Version};
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, error, warn};
use url::Url;

use crate::routing::{Handler, RoutingError};

/// 프록시 전 구간에서 사용하는 요청/응답 본문 타입입니다.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// 백엔드 요청에 사용하는 HTTP 클라이언트입니다. 복제 시 커넥션 풀을 공유합니다.
pub type ProxyClient = legacy::Client<HttpConnector, ProxyBody>;

/// 요청을 보낸 클라이언트 주소. 서버가 요청 확장에 기록합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

// 홉 단위 헤더는 백엔드로 전달하지 않는다
const HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

/// 백엔드 전달 실패 사유. 502 응답의 확장에 기록됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError(pub String);

const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub fn http_client() -> ProxyClient {
    legacy::Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// 백엔드 URL 문자열을 파싱합니다.
///
/// `://`가 없으면 `http://`를 붙여서 파싱합니다.
///
/// ```
/// use vhost_gate::proxy::parse_backend_url;
///
/// let url = parse_backend_url("backend:9000").unwrap();
/// assert_eq!(url.as_str(), "http://backend:9000/");
/// assert!(parse_backend_url("backend:99999").is_err());
/// ```
pub fn parse_backend_url(backend: &str) -> Result<Url, RoutingError> {
    let raw = if backend.contains("://") {
        backend.to_string()
    } else {
        format!("http://{}", backend)
    };

    let url = Url::parse(&raw).map_err(|e| RoutingError::InvalidBackendUrl {
        url: backend.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(RoutingError::UnsupportedScheme {
            url: backend.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(RoutingError::InvalidBackendUrl {
            url: backend.to_string(),
            reason: "호스트가 없음".to_string(),
        });
    }

    Ok(url)
}

/// 하나의 백엔드 URL에 묶인 프록시 핸들러입니다.
///
/// 백엔드 URL의 경로는 요청 경로 앞에 붙는 고정 접두사로, 쿼리는 요청
/// 쿼리와 합쳐서 사용합니다. 원래 `Host` 헤더는 그대로 전달합니다.
#[derive(Clone)]
pub struct ReverseProxy {
    target: Url,
    authority: String,
    client: ProxyClient,
}

impl ReverseProxy {
    pub fn new(target: Url, client: ProxyClient) -> Self {
        let host = target.host_str().unwrap_or_default();
        let authority = match target.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Self {
            target,
            authority,
            client,
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// 요청 URI를 백엔드 기준의 절대 URI로 바꿉니다.
    pub fn target_uri(&self, uri: &Uri) -> Result<Uri, hyper::http::Error> {
        let path = join_paths(self.target.path(), uri.path());
        let query = match (
            self.target.query().filter(|q| !q.is_empty()),
            uri.query().filter(|q| !q.is_empty()),
        ) {
            (Some(base), Some(extra)) => Some(format!("{}&{}", base, extra)),
            (Some(base), None) => Some(base.to_string()),
            (None, Some(extra)) => Some(extra.to_string()),
            (None, None) => None,
        };

        let path_and_query = match query {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        Uri::builder()
            .scheme(self.target.scheme())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Debug for ReverseProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseProxy")
            .field("target", &self.target.as_str())
            .finish()
    }
}

#[async_trait]
impl Handler for ReverseProxy {
    async fn serve(&self, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let (mut parts, body) = req.into_parts();

        parts.uri = match self.target_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                warn!(error = %e, backend = %self.target, "백엔드 URI 생성 실패");
                return bad_gateway(format!("Invalid backend URI: {}", e));
            }
        };
        parts.version = Version::HTTP_11;
        remove_hop_headers(&mut parts.headers);

        if let Some(ClientAddr(peer)) = parts.extensions.get::<ClientAddr>().copied() {
            append_forwarded_for(&mut parts.headers, peer.ip());
        }

        debug!(uri = %parts.uri, "백엔드로 요청 전달");
        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(res) => {
                let (mut parts, body) = res.into_parts();
                remove_hop_headers(&mut parts.headers);
                Response::from_parts(parts, body.boxed())
            }
            Err(e) => {
                error!(error = %e, backend = %self.target, "백엔드 요청 실패");
                bad_gateway(format!("Backend request failed: {}", e))
            }
        }
    }

    fn backend(&self) -> Option<&Url> {
        Some(&self.target)
    }
}

pub fn full_body(content: impl Into<Bytes>) -> ProxyBody {
    Full::new(content.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn error_response(status: StatusCode, message: impl Into<Bytes>) -> Response<ProxyBody> {
    let mut response = Response::new(full_body(message));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn bad_gateway(message: String) -> Response<ProxyBody> {
    let mut response = error_response(StatusCode::BAD_GATEWAY, message.clone());
    response.extensions_mut().insert(BackendError(message));
    response
}

pub fn not_found() -> Response<ProxyBody> {
    error_response(StatusCode::NOT_FOUND, "404 page not found\n")
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn remove_hop_headers(headers: &mut HeaderMap) {
    // Connection 헤더에 나열된 헤더도 홉 단위로 취급
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_HEADERS.iter()) {
        headers.remove(name);
    }
    headers.remove("proxy-connection");
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip.to_string(),
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
