use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::routing::matcher::{Matcher, Score};

/// 패턴과 핸들러 한 쌍입니다.
pub struct Registration<H: ?Sized> {
    pub pattern: String,
    pub handler: Arc<H>,
}

impl<H: ?Sized> Clone for Registration<H> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// `find` 결과로 선택된 등록 정보입니다.
pub struct Matched<H: ?Sized> {
    pub pattern: String,
    pub score: Score,
    pub handler: Arc<H>,
}

/// 한 라우팅 레벨의 패턴 레지스트리입니다.
///
/// 등록 목록은 불변 스냅샷으로 보관되며, 변경 연산은 새 스냅샷을 만들어
/// 원자적으로 교체합니다. 조회는 락 없이 현재 스냅샷 하나만 봅니다.
///
/// 같은 점수의 후보가 여럿이면 먼저 등록된 패턴이 선택됩니다.
/// 기존 패턴을 다시 `map`하면 핸들러만 바뀌고 등록 순서는 유지됩니다.
pub struct Router<H: ?Sized, M> {
    matcher: M,
    entries: ArcSwap<Vec<Registration<H>>>,
    // 변경 연산끼리의 상호 배제
    write_lock: Mutex<()>,
}

impl<H: ?Sized, M: Matcher> Router<H, M> {
    pub fn new(matcher: M) -> Self {
        Self {
            matcher,
            entries: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// 패턴에 핸들러를 등록합니다. 같은 패턴이 있으면 교체합니다.
    pub fn map(&self, pattern: &str, handler: Arc<H>) {
        let pattern = self.matcher.normalize(pattern);
        self.update(|entries| {
            match entries.iter_mut().find(|entry| entry.pattern == pattern) {
                Some(entry) => entry.handler = handler,
                None => entries.push(Registration {
                    pattern: pattern.to_string(),
                    handler,
                }),
            }
        });
    }

    /// 패턴 등록을 제거합니다. 없으면 아무 일도 하지 않고 `false`를 반환합니다.
    pub fn delete(&self, pattern: &str) -> bool {
        let pattern = self.matcher.normalize(pattern);
        self.update(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.pattern != pattern);
            entries.len() != before
        })
    }

    /// 모든 등록을 제거합니다.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries.store(Arc::new(Vec::new()));
    }

    /// 전체 등록 목록을 한 번에 교체합니다.
    ///
    /// 중복 패턴은 나중 값이 앞선 위치를 차지합니다.
    pub fn sync<I>(&self, registrations: I)
    where
        I: IntoIterator<Item = (String, Arc<H>)>,
    {
        let mut next: Vec<Registration<H>> = Vec::new();
        for (pattern, handler) in registrations {
            let pattern = self.matcher.normalize(&pattern).to_string();
            match next.iter_mut().find(|entry| entry.pattern == pattern) {
                Some(entry) => entry.handler = handler,
                None => next.push(Registration { pattern, handler }),
            }
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries.store(Arc::new(next));
    }

    /// 후보와 가장 잘 매칭되는 핸들러를 반환합니다.
    pub fn find(&self, candidate: &str) -> Option<Arc<H>> {
        self.lookup(candidate).map(|matched| matched.handler)
    }

    /// `find`와 같지만 선택된 패턴과 점수도 함께 반환합니다.
    pub fn lookup(&self, candidate: &str) -> Option<Matched<H>> {
        let candidate = self.matcher.normalize(candidate);
        let entries = self.entries.load();

        let mut best: Option<(&Registration<H>, Score)> = None;
        for entry in entries.iter() {
            let Some(score) = self.matcher.score(&entry.pattern, candidate) else {
                continue;
            };
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        best.map(|(entry, score)| Matched {
            pattern: entry.pattern.clone(),
            score,
            handler: Arc::clone(&entry.handler),
        })
    }

    /// 패턴으로 등록된 핸들러를 그대로 가져옵니다. 매칭 규칙은 적용하지 않습니다.
    pub fn get(&self, pattern: &str) -> Option<Arc<H>> {
        let pattern = self.matcher.normalize(pattern);
        self.entries
            .load()
            .iter()
            .find(|entry| entry.pattern == pattern)
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// 등록 순서대로 패턴 목록을 반환합니다.
    pub fn patterns(&self) -> Vec<String> {
        self.entries
            .load()
            .iter()
            .map(|entry| entry.pattern.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    fn update<R>(&self, apply: impl FnOnce(&mut Vec<Registration<H>>) -> R) -> R {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.entries.load_full();
        let mut next: Vec<Registration<H>> = (*current).clone();
        let result = apply(&mut next);
        self.entries.store(Arc::new(next));
        result
    }
}

impl<H: ?Sized, M: Matcher + Default> Default for Router<H, M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<H: ?Sized, M: Matcher + fmt::Debug> fmt::Debug for Router<H, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("matcher", &self.matcher)
            .field("patterns", &self.patterns())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::{HostMatcher, PathMatcher};

    fn handler(name: &str) -> Arc<str> {
        Arc::from(name)
    }

    #[test]
    fn test_equal_scores_prefer_earliest_registration() {
        // "*.a.com:*"와 "*.b.a.com"은 모두 길이 9, 둘 다 와일드카드 규칙
        let router: Router<str, HostMatcher> = Router::default();
        router.map("*.a.com:*", handler("first"));
        router.map("*.b.a.com", handler("second"));

        let matched = router.lookup("x.b.a.com").unwrap();
        assert_eq!(&*matched.handler, "first");
        assert_eq!(matched.pattern, "*.a.com:*");

        // 재등록은 순서를 바꾸지 않는다
        router.map("*.b.a.com", handler("second-v2"));
        assert_eq!(&*router.find("x.b.a.com").unwrap(), "first");
        router.map("*.a.com:*", handler("first-v2"));
        assert_eq!(&*router.find("x.b.a.com").unwrap(), "first-v2");
    }

    #[test]
    fn test_patterns_are_normalized_on_map_and_delete() {
        let router: Router<str, HostMatcher> = Router::default();
        router.map("http://example.com/ignored", handler("a"));

        assert_eq!(router.patterns(), vec!["example.com".to_string()]);
        assert!(router.get("example.com").is_some());
        assert!(router.delete("https://example.com"));
        assert!(router.is_empty());
    }

    #[test]
    fn test_sync_deduplicates_in_place() {
        let router: Router<str, PathMatcher> = Router::default();
        router.map("/old", handler("old"));
        router.sync(vec![
            ("/a".to_string(), handler("a1")),
            ("/b".to_string(), handler("b")),
            ("/a".to_string(), handler("a2")),
        ]);

        assert_eq!(router.patterns(), vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(&*router.find("/a/x").unwrap(), "a2");
        assert!(router.find("/old").is_none());
    }

    #[test]
    fn test_lookup_snapshot_survives_clear() {
        let router: Router<str, PathMatcher> = Router::default();
        router.map("/", handler("root"));

        let held = router.find("/anything").unwrap();
        router.clear();

        assert_eq!(&*held, "root");
        assert!(router.find("/anything").is_none());
    }
}
