//! 라우팅 레벨별 패턴 매처입니다.
//!
//! 매처는 `(pattern, candidate)` 한 쌍에 대해 매칭 여부와 구체성 점수를
//! 계산하는 순수 함수입니다. 매칭되지 않으면 `None`을 반환합니다.

/// 매칭 구체성 점수. 높을수록 우선합니다.
///
/// 필드 순서대로 비교됩니다. 정확히 일치한 패턴은 길이와 무관하게 모든
/// 와일드카드보다 앞서고, 와일드카드끼리는 `specificity`(패턴 길이),
/// 길이가 같으면 `precedence`(규칙 종류) 순입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    /// 와일드카드 없이 일치
    pub exact: bool,
    /// 패턴 길이 (`*`는 1)
    pub specificity: usize,
    /// 같은 길이에서의 규칙 우선순위
    pub precedence: u8,
}

impl Score {
    pub const fn new(specificity: usize, precedence: u8) -> Self {
        Self {
            exact: precedence == EXACT,
            specificity,
            precedence,
        }
    }
}

/// 하나의 라우팅 레벨에서 사용하는 매칭 규칙입니다.
pub trait Matcher: Send + Sync {
    /// 매칭 전에 후보 문자열(및 등록 패턴)을 정규화합니다.
    fn normalize<'a>(&self, candidate: &'a str) -> &'a str {
        candidate
    }

    /// `pattern`이 `candidate`와 매칭되면 점수를 반환합니다.
    fn score(&self, pattern: &str, candidate: &str) -> Option<Score>;
}

const UNIVERSAL: u8 = 0;
const SUFFIX_WILDCARD: u8 = 1;
const PORT_WILDCARD: u8 = 2;
const EXACT: u8 = 3;

/// 가상 호스트 패턴 매처입니다.
///
/// 지원 패턴:
///
/// * `*` - 모든 호스트 (최하위 폴백)
/// * `example.com:*` - 포트와 무관하게 `example.com`
/// * `*.example.com` - `example.com` 및 모든 하위 도메인
/// * `api.example.com`, `api.example.com:8080` - 정확히 일치
///
/// 호스트 이름 비교는 ASCII 대소문자를 구분하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostMatcher {
    /// 후보에서 `scheme://` 접두사와 첫 `/` 이후를 제거
    pub trim_scheme: bool,
    /// `host:*` 포트 와일드카드 패턴 지원
    pub port_wildcard: bool,
}

impl HostMatcher {
    /// 스킴 제거와 포트 와일드카드를 모두 끈 매처입니다.
    pub const fn legacy() -> Self {
        Self {
            trim_scheme: false,
            port_wildcard: false,
        }
    }
}

impl Default for HostMatcher {
    fn default() -> Self {
        Self {
            trim_scheme: true,
            port_wildcard: true,
        }
    }
}

impl Matcher for HostMatcher {
    fn normalize<'a>(&self, candidate: &'a str) -> &'a str {
        if self.trim_scheme {
            normalize_host(candidate)
        } else {
            candidate
        }
    }

    fn score(&self, pattern: &str, candidate: &str) -> Option<Score> {
        if pattern == "*" {
            return Some(Score::new(1, UNIVERSAL));
        }

        let specificity = pattern.len();
        let mut pattern = pattern;
        let mut candidate = candidate;
        let mut precedence = EXACT;

        if self.port_wildcard {
            if let Some(bare) = pattern.strip_suffix(":*") {
                pattern = bare;
                candidate = strip_port(candidate);
                precedence = PORT_WILDCARD;
            }
        }

        if let Some(domain) = pattern.strip_prefix("*.").filter(|d| !d.is_empty()) {
            // 선행 '*'만 떼어낸 ".example.com"을 접미사로 사용
            let suffix = &pattern[1..];
            let matched = candidate.eq_ignore_ascii_case(domain)
                || ends_with_ignore_ascii_case(candidate, suffix);
            return matched.then(|| Score::new(specificity, SUFFIX_WILDCARD));
        }

        candidate
            .eq_ignore_ascii_case(pattern)
            .then(|| Score::new(specificity, precedence))
    }
}

/// 경로 접두사 매처입니다.
///
/// 후보가 패턴으로 시작하면 매칭되고, 점수는 패턴 길이입니다.
/// 따라서 `""`와 `"/"`는 항상 가장 낮은 점수의 캐치올이 됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathMatcher;

impl Matcher for PathMatcher {
    fn score(&self, pattern: &str, candidate: &str) -> Option<Score> {
        candidate
            .starts_with(pattern)
            .then(|| Score::new(pattern.len(), EXACT))
    }
}

/// 호스트 문자열에서 authority(`host[:port]`) 부분만 남깁니다.
///
/// ```
/// use vhost_gate::routing::normalize_host;
///
/// assert_eq!(normalize_host("http://example.com:8080/index.html"), "example.com:8080");
/// assert_eq!(normalize_host("example.com"), "example.com");
/// ```
pub fn normalize_host(host: &str) -> &str {
    let host = match host.find("://") {
        Some(n) => &host[n + 3..],
        None => host,
    };

    match host.find('/') {
        Some(n) => &host[..n],
        None => host,
    }
}

fn strip_port(host: &str) -> &str {
    // "[::1]"처럼 포트 없는 IPv6 리터럴은 그대로 둔다
    if host.ends_with(']') {
        return host;
    }

    match host.rfind(':') {
        Some(n) if n > 0 => &host[..n],
        _ => host,
    }
}

fn ends_with_ignore_ascii_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.as_bytes()[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}
