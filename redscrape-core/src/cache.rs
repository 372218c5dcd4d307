//! Time-bounded memoization of identical collection requests.
//!
//! This sits outside the collection pipeline: callers key it by source
//! identifier and filter parameters and consult it before running a request.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::FilterKind;

/// Cache key for a collection request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Subreddit {
        name: String,
        filter: FilterKind,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Thread {
        url: String,
    },
}

impl RequestKey {
    /// Subreddit names are case-insensitive on Reddit.
    pub fn subreddit(
        name: &str,
        filter: FilterKind,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        let (start, end) = match filter {
            FilterKind::DateRange => (start, end),
            _ => (None, None),
        };
        RequestKey::Subreddit {
            name: name.trim().to_lowercase(),
            filter,
            start,
            end,
        }
    }

    pub fn thread(url: &str) -> Self {
        RequestKey::Thread {
            url: url.trim().to_string(),
        }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        let fresh = match entries.get(key) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => return None,
        };

        if fresh {
            debug!("Cache hit for {:?}", key);
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            debug!("Cache entry for {:?} expired", key);
            entries.remove(key);
            None
        }
    }

    fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.lock();
        entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < self.ttl);
        entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
