use async_trait::async_trait;
use hyper::{Request, Response};
use url::Url;

use crate::proxy::ProxyBody;

/// 라우팅 결과로 선택되어 요청을 처리하는 객체입니다.
///
/// 백엔드 프록시, 경로 라우터(`Host`), 최상위 `Gate`가 모두 이 트레이트를
/// 구현하므로 라우터는 핸들러의 구체 타입을 알 필요가 없습니다.
#[async_trait]
pub trait Handler: Send + Sync {
    /// 요청을 처리하고 응답을 반환합니다. 실패도 응답으로 표현합니다.
    async fn serve(&self, req: Request<ProxyBody>) -> Response<ProxyBody>;

    /// 요청을 전달하는 백엔드 URL (로깅용)
    fn backend(&self) -> Option<&Url> {
        None
    }
}
