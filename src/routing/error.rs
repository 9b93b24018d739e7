use std::fmt;

/// 라우트 등록 시점에 발생하는 에러입니다.
///
/// 요청 처리 중의 "매칭 없음"은 에러가 아니라 `None`으로 표현되며,
/// `serve`가 404 응답으로 변환합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// 백엔드 URL 파싱 실패
    InvalidBackendUrl {
        url: String,
        reason: String,
    },
    /// 지원하지 않는 백엔드 스킴
    UnsupportedScheme {
        url: String,
        scheme: String,
    },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidBackendUrl { url, reason } =>
                write!(f, "유효하지 않은 백엔드 URL {}: {}", url, reason),
            RoutingError::UnsupportedScheme { url, scheme } =>
                write!(f, "지원하지 않는 백엔드 스킴 {} ({})", scheme, url),
        }
    }
}

impl std::error::Error for RoutingError {}
