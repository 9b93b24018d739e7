//! Vhost Gate는 가상 호스트와 경로, 두 단계로 요청을 라우팅하는 리버스 프록시입니다.
//!
//! # 주요 기능
//!
//! - 와일드카드 호스트 패턴 (`*`, `*.example.com`, `example.com:*`)
//! - 가장 긴 접두사 우선의 경로 라우팅
//! - 요청 처리 중에도 안전한 라우트 추가/삭제/교체
//! - 라우트 파일(TOML/JSON) 변경 시 자동 재적용
//!
//! # 예제
//!
//! ```
//! use vhost_gate::routing::{Gate, Handler, Host};
//!
//! let gate = Gate::new();
//!
//! // 경로 라우트 등록
//! let host = Host::new();
//! host.map_route("/", "10.0.0.1:80").unwrap();
//! host.map_route("/api", "http://10.0.0.2:9000").unwrap();
//!
//! // 호스트 패턴 등록
//! gate.map_host("*.example.com", host);
//!
//! let host = gate.find_host("svc.example.com").unwrap();
//! let route = host.find_route("/api/widgets").unwrap();
//! assert_eq!(route.backend().unwrap().as_str(), "http://10.0.0.2:9000/");
//!
//! assert!(gate.find_host("other.org").is_none());
//! ```
//!
//! # 라우트 변경
//!
//! ```
//! use vhost_gate::routing::{Gate, Host};
//!
//! let gate = Gate::new();
//! gate.map_host("*", Host::new());
//!
//! // 등록된 Host를 꺼내 경로 라우트를 추가
//! let fallback = gate.host("*").unwrap();
//! fallback.map_route("/", "backend:8080").unwrap();
//! assert!(fallback.map_route("/bad", "backend:99999").is_err());
//! assert_eq!(fallback.patterns(), vec!["/".to_string()]);
//!
//! gate.delete_host("*");
//! assert!(gate.is_empty());
//! ```

pub mod logging;
pub mod proxy;
pub mod routing;
pub mod server;
pub mod settings;
