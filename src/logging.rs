use std::ffi::OsStr;
use std::path::Path;

use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, span, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use crate::settings::logging::{LogFormat, LogOutput, LogSettings};

/// 전역 tracing 구독자를 설치합니다.
///
/// 반환된 guard가 살아있는 동안만 로그가 기록되므로 `main`에서 보관해야 합니다.
/// `RUST_LOG`가 설정되어 있으면 설정 파일의 레벨보다 우선합니다.
pub fn init_logging(settings: &LogSettings) -> WorkerGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level).into())
        .from_env_lossy();

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .unwrap_or_else(|| OsStr::new("vhost_gate.log"));
            tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::new(Rfc3339))
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true);

    match settings.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_file(true).with_line_number(true).init(),
    }

    guard
}

/// 요청 하나의 처리 결과를 모아 한 줄로 기록합니다.
#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub host: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub backend: Option<String>,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            host: String::new(),
            status_code: 0,
            duration_ms: 0,
            backend: None,
            error: None,
        }
    }

    pub fn with_request<B>(&mut self, req: &hyper::Request<B>) {
        self.method = req.method().to_string();
        self.path = req.uri().path().to_string();
        self.host = crate::routing::request_host(req).to_string();

        debug!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            host = %self.host,
            "요청 수신"
        );
    }

    pub fn with_backend(&mut self, backend: &url::Url) {
        self.backend = Some(backend.to_string());
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }
}

pub fn log_request(log: &RequestLog) {
    let level = if log.error.is_some() || log.status_code >= 500 {
        Level::ERROR
    } else if log.status_code >= 400 {
        Level::WARN
    } else {
        Level::INFO
    };

    let span = span!(
        Level::INFO,
        "request",
        request_id = %log.request_id,
        method = %log.method,
        path = %log.path,
        host = %log.host,
        status = %log.status_code,
        duration_ms = %log.duration_ms
    );
    let _enter = span.enter();

    match level {
        Level::ERROR => error!(
            backend = ?log.backend,
            error = ?log.error,
            "요청 실패"
        ),
        Level::WARN => warn!(
            backend = ?log.backend,
            "요청 완료 (클라이언트 오류)"
        ),
        _ => info!(
            backend = ?log.backend,
            "요청 완료"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_log_collects_fields() {
        let req = hyper::Request::builder()
            .method("POST")
            .uri("/api/widgets?id=1")
            .header("Host", "svc.example.com")
            .body(())
            .unwrap();

        let mut log = RequestLog::new("req-1".to_string());
        log.with_request(&req);
        log.with_backend(&"http://10.0.0.1:8080/".parse().unwrap());
        log.with_response(hyper::StatusCode::OK);

        assert_eq!(log.method, "POST");
        assert_eq!(log.path, "/api/widgets");
        assert_eq!(log.host, "svc.example.com");
        assert_eq!(log.backend.as_deref(), Some("http://10.0.0.1:8080/"));
        assert_eq!(log.status_code, 200);
        assert!(log.error.is_none());

        log.with_response(hyper::StatusCode::BAD_GATEWAY);
        log.with_error("Backend request failed: connection refused");
        assert_eq!(log.error.as_deref(), Some("Backend request failed: connection refused"));
    }
}
