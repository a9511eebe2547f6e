use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Time-bounded memo of successful loads.
///
/// Entries are keyed by the exact URL string the user supplied, so two
/// sessions loading the same link share a result. Expiry is checked on read;
/// there is no explicit invalidation.
#[derive(Debug, Clone)]
pub struct EventCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    events: Vec<String>,
    fetched_at: Instant,
}

impl EventCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached events for `url` if still fresh at `now`; stale entries are
    /// evicted.
    pub fn get(&mut self, url: &str, now: Instant) -> Option<Vec<String>> {
        let entry = self.entries.get(url)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            return Some(entry.events.clone());
        }
        self.entries.remove(url);
        None
    }

    /// Stores a result, dropping every entry already past its TTL.
    pub fn insert(&mut self, url: &str, events: Vec<String>, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.fetched_at) < ttl);
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                events,
                fetched_at: now,
            },
        );
    }
}

impl Default for EventCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::EventCache;

    #[test]
    fn fresh_entry_is_returned() {
        let mut cache = EventCache::new(Duration::from_secs(600));
        let t0 = Instant::now();
        cache.insert("u", vec!["flood".to_string()], t0);
        let hit = cache.get("u", t0 + Duration::from_secs(599));
        assert_eq!(hit, Some(vec!["flood".to_string()]));
    }

    #[test]
    fn expired_entry_is_evicted() {
        let mut cache = EventCache::new(Duration::from_secs(600));
        let t0 = Instant::now();
        cache.insert("u", vec!["flood".to_string()], t0);
        assert_eq!(cache.get("u", t0 + Duration::from_secs(600)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_exact_urls() {
        let mut cache = EventCache::default();
        let t0 = Instant::now();
        cache.insert("https://a/d/1/edit", vec!["x".to_string()], t0);
        assert_eq!(cache.get("https://a/d/1/edit?usp=sharing", t0), None);
    }

    #[test]
    fn insert_sweeps_stale_entries_for_other_urls() {
        let mut cache = EventCache::new(Duration::from_secs(600));
        let t0 = Instant::now();
        cache.insert("old", vec!["a".to_string()], t0);
        cache.insert("recent", vec!["b".to_string()], t0 + Duration::from_secs(300));
        cache.insert("new", vec!["c".to_string()], t0 + Duration::from_secs(700));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("old", t0 + Duration::from_secs(700)), None);
        assert!(cache.get("recent", t0 + Duration::from_secs(700)).is_some());
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let mut cache = EventCache::new(Duration::ZERO);
        let t0 = Instant::now();
        cache.insert("u", vec!["x".to_string()], t0);
        assert!(cache.is_empty());
    }
}
