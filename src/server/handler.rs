use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::logging::{log_request, RequestLog};
use crate::proxy::{self, BackendError, ClientAddr, ProxyBody};
use crate::routing::{Gate, Handler};

/// 연결 단위로 요청을 받아 게이트로 라우팅합니다.
pub struct RequestHandler {
    gate: Arc<Gate>,
}

impl RequestHandler {
    pub fn new(gate: Arc<Gate>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub async fn handle_request(
        &self,
        req: Request<Incoming>,
        peer: SocketAddr,
    ) -> Result<Response<ProxyBody>, Infallible> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("request", request_id = %request_id);
        let start_time = Instant::now();

        let mut log = RequestLog::new(request_id);
        log.with_request(&req);

        let mut req = req.map(|body| body.boxed());
        req.extensions_mut().insert(ClientAddr(peer));

        // 라우팅 결과를 먼저 꺼내 두고, 전달은 라우터 밖에서 수행
        let response = match self.gate.resolve(&req) {
            Some(handler) => {
                if let Some(backend) = handler.backend() {
                    log.with_backend(backend);
                }
                handler.serve(req).instrument(span).await
            }
            None => proxy::not_found(),
        };

        if let Some(BackendError(reason)) = response.extensions().get::<BackendError>() {
            log.with_error(reason);
        }
        log.with_response(response.status());
        log.duration_ms = start_time.elapsed().as_millis() as u64;
        log_request(&log);

        Ok(response)
    }

    pub async fn handle_connection<I>(&self, io: I, peer: SocketAddr) -> Result<(), hyper::Error>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(
                io,
                service_fn(|req| self.handle_request(req, peer)),
            )
            .await
    }
}
