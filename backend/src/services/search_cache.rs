use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::{SearchOutcome, SearchQuery};

struct CachedSearch {
    outcome: SearchOutcome,
    stored_at: Instant,
}

/// Completed searches keyed by the full query, expiring after `ttl`.
pub struct SearchCache {
    ttl: Duration,
    entries: Mutex<HashMap<SearchQuery, CachedSearch>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, query: &SearchQuery) -> Option<SearchOutcome> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };

        match entries.get(query) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!("Search cache hit for {:?}", query.keyword());
                Some(entry.outcome.clone())
            }
            Some(_) => {
                debug!("Search cache entry for {:?} expired", query.keyword());
                entries.remove(query);
                None
            }
            None => None,
        }
    }

    /// Returns false when the outcome is partial (quota or cancellation) and
    /// was therefore not stored.
    pub fn insert(&self, query: SearchQuery, outcome: SearchOutcome) -> bool {
        if !outcome.is_complete() {
            return false;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                query,
                CachedSearch {
                    outcome,
                    stored_at: Instant::now(),
                },
            );
            true
        } else {
            false
        }
    }

    pub fn invalidate(&self, query: &SearchQuery) -> bool {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(query).is_some()
        } else {
            false
        }
    }

    pub fn clear(&self) -> usize {
        if let Ok(mut entries) = self.entries.lock() {
            let count = entries.len();
            entries.clear();
            count
        } else {
            0
        }
    }

    pub fn purge_expired(&self) -> usize {
        if let Ok(mut entries) = self.entries.lock() {
            let before = entries.len();
            entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
            before - entries.len()
        } else {
            0
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DurationFilter;

    fn outcome(pages: usize) -> SearchOutcome {
        SearchOutcome {
            pages_fetched: pages,
            ..Default::default()
        }
    }

    #[test]
    fn hit_within_ttl() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let query = SearchQuery::new("rust", 10).unwrap();

        assert!(cache.insert(query.clone(), outcome(2)));
        assert_eq!(cache.get(&query).map(|o| o.pages_fetched), Some(2));
    }

    #[test]
    fn key_is_the_whole_query() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let query = SearchQuery::new("rust", 10).unwrap();
        cache.insert(query.clone(), outcome(1));

        let shorts = query.clone().with_duration(DurationFilter::Short);
        assert!(cache.get(&shorts).is_none());
        assert!(cache.get(&SearchQuery::new("rust", 11).unwrap()).is_none());
    }

    #[test]
    fn zero_ttl_always_misses_and_purges() {
        let cache = SearchCache::new(Duration::ZERO);
        let query = SearchQuery::new("rust", 10).unwrap();
        cache.insert(query.clone(), outcome(1));

        assert_eq!(cache.purge_expired(), 1);
        cache.insert(query.clone(), outcome(1));
        assert!(cache.get(&query).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn partial_outcomes_are_not_cached() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let query = SearchQuery::new("rust", 10).unwrap();
        let partial = SearchOutcome {
            quota_exceeded: true,
            ..Default::default()
        };

        assert!(!cache.insert(query.clone(), partial));
        assert!(cache.get(&query).is_none());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let a = SearchQuery::new("a", 10).unwrap();
        let b = SearchQuery::new("b", 10).unwrap();
        cache.insert(a.clone(), outcome(1));
        cache.insert(b.clone(), outcome(1));

        assert!(cache.invalidate(&a));
        assert!(!cache.invalidate(&a));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(), 1);
        assert!(cache.get(&b).is_none());
    }
}
