use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use hyper_util::rt::TokioIo;
use crate::settings::ServerSettings;
use tracing::{debug, error, info};
use super::handler::RequestHandler;
use super::Result;

pub struct ServerListener {
    http_listener: TcpListener,
    local_addr: SocketAddr,
}

impl ServerListener {
    pub async fn bind(settings: &ServerSettings) -> Result<Self> {
        let addr = settings.socket_addr();
        let http_listener = TcpListener::bind(addr)
            .await
            .map_err(|e| {
                error!(error = %e, addr = %addr, "HTTP 포트 바인딩 실패");
                e
            })?;

        let local_addr = http_listener.local_addr()?;
        info!(addr = %local_addr, "HTTP 리스너 시작");

        Ok(Self {
            http_listener,
            local_addr,
        })
    }

    /// 실제 바인딩된 주소 (포트 0으로 바인딩한 경우 확인용)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 연결을 계속 수락하며 연결마다 태스크를 하나씩 띄웁니다.
    pub async fn run(self, handler: Arc<RequestHandler>) -> Result<()> {
        loop {
            match self.http_listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "연결 수락");
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        if let Err(err) = handler.handle_connection(io, peer).await {
                            error!(error = %err, peer = %peer, "HTTP 연결 처리 실패");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "HTTP 연결 수락 실패");
                }
            }
        }
    }
}
