//! 호스트/경로 2단계 라우팅 엔진입니다.
//!
//! * [`Gate`] - 가상 호스트 패턴으로 [`Host`]를 선택
//! * [`Host`] - 경로 패턴으로 백엔드 핸들러를 선택
//! * [`Router`] - 두 레벨이 공유하는 패턴 레지스트리

mod error;
mod gate;
mod handler;
mod host;
mod matcher;
mod router;

pub use error::RoutingError;
pub use gate::{request_host, Gate};
pub use handler::Handler;
pub use host::Host;
pub use matcher::{normalize_host, HostMatcher, Matcher, PathMatcher, Score};
pub use router::{Matched, Registration, Router};
