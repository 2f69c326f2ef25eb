//! Tag-aware cache storage.
//!
//! The store keeps serialized payloads under string keys, each tagged with
//! the collections it was computed from. Entries leave the store on tag
//! invalidation, expiry, or LRU eviction; all three paths keep the tag
//! index in step.

use std::collections::BTreeSet;
use std::sync::Mutex;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;

use super::config::CacheConfig;
use super::keys::Tag;
use super::lock::mutex_lock;
use super::registry::{FillTicket, TagIndex};

const SOURCE: &str = "cache::store";
const METRIC_EVICT: &str = "bilemo_cache_evict_total";

/// One stored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Bytes,
    pub tags: BTreeSet<Tag>,
    pub expires_at: OffsetDateTime,
}

impl CacheEntry {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// What happened to an entry handed to [`TagAwareStore::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored,
    /// Stored, and the least recently used entry was evicted to make room.
    StoredWithEviction(String),
    /// Not stored: one of the entry's tags was invalidated after the ticket
    /// was issued.
    Discarded,
}

/// Storage behind the read-through cache. Shared across request workers.
pub trait TagAwareStore: Send + Sync {
    /// Unexpired entry for `key`. An expired entry is dropped on sight.
    fn get(&self, key: &str, now: OffsetDateTime) -> Option<CacheEntry>;

    /// Snapshot the generations of `tags` before computing a fill.
    fn begin_fill(&self, tags: &[Tag]) -> FillTicket;

    /// Store `entry` unless its tags were invalidated since `ticket`.
    fn insert(&self, entry: CacheEntry, ticket: &FillTicket) -> InsertOutcome;

    fn remove(&self, key: &str) -> bool;

    /// Drop every entry carrying any of `tags`. Returns the number dropped.
    fn invalidate_tags(&self, tags: &[Tag]) -> usize;

    /// Drop every entry expired at `now`. Returns the number dropped.
    fn purge_expired(&self, now: OffsetDateTime) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    index: TagIndex,
}

impl Inner {
    fn drop_key(&mut self, key: &str) -> bool {
        self.index.unregister(key);
        self.entries.pop(key).is_some()
    }
}

/// In-process [`TagAwareStore`] bounded by LRU eviction.
pub struct MemoryTagStore {
    inner: Mutex<Inner>,
}

impl MemoryTagStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(config.max_entries_non_zero()),
                index: TagIndex::default(),
            }),
        }
    }

    #[cfg(test)]
    fn indexed_keys(&self) -> usize {
        mutex_lock(&self.inner, SOURCE, "indexed_keys")
            .index
            .key_count()
    }
}

impl TagAwareStore for MemoryTagStore {
    fn get(&self, key: &str, now: OffsetDateTime) -> Option<CacheEntry> {
        let mut inner = mutex_lock(&self.inner, SOURCE, "get");
        let expired = inner.entries.get(key)?.is_expired(now);
        if expired {
            inner.drop_key(key);
            debug!(key, "Dropped expired cache entry");
            return None;
        }
        inner.entries.get(key).cloned()
    }

    fn begin_fill(&self, tags: &[Tag]) -> FillTicket {
        mutex_lock(&self.inner, SOURCE, "begin_fill")
            .index
            .ticket(tags)
    }

    fn insert(&self, entry: CacheEntry, ticket: &FillTicket) -> InsertOutcome {
        let mut guard = mutex_lock(&self.inner, SOURCE, "insert");
        let inner = &mut *guard;
        if !inner.index.is_current(ticket) {
            return InsertOutcome::Discarded;
        }

        let key = entry.key.clone();
        let tags = entry.tags.clone();
        let evicted = match inner.entries.push(key.clone(), entry) {
            Some((old_key, _)) if old_key != key => {
                inner.index.unregister(&old_key);
                counter!(METRIC_EVICT).increment(1);
                Some(old_key)
            }
            _ => None,
        };
        inner.index.register(key, tags);

        match evicted {
            Some(old_key) => InsertOutcome::StoredWithEviction(old_key),
            None => InsertOutcome::Stored,
        }
    }

    fn remove(&self, key: &str) -> bool {
        mutex_lock(&self.inner, SOURCE, "remove").drop_key(key)
    }

    fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        let mut inner = mutex_lock(&self.inner, SOURCE, "invalidate_tags");
        inner.index.bump(tags);
        let keys = inner.index.keys_for_tags(tags);
        keys.iter().filter(|key| inner.drop_key(key)).count()
    }

    fn purge_expired(&self, now: OffsetDateTime) -> usize {
        let mut inner = mutex_lock(&self.inner, SOURCE, "purge_expired");
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        expired.iter().filter(|key| inner.drop_key(key)).count()
    }

    fn len(&self) -> usize {
        mutex_lock(&self.inner, SOURCE, "len").entries.len()
    }

    fn clear(&self) {
        let mut inner = mutex_lock(&self.inner, SOURCE, "clear");
        inner.entries.clear();
        inner.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::Duration;

    use super::*;

    fn entry(key: &str, tags: &[Tag], expires_at: OffsetDateTime) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            value: Bytes::from(format!("payload:{key}")),
            tags: tags.iter().cloned().collect(),
            expires_at,
        }
    }

    fn store_with_capacity(max_entries: usize) -> MemoryTagStore {
        MemoryTagStore::new(&CacheConfig {
            max_entries,
            ..Default::default()
        })
    }

    fn put(store: &MemoryTagStore, entry: CacheEntry) -> InsertOutcome {
        let tags: Vec<Tag> = entry.tags.iter().cloned().collect();
        let ticket = store.begin_fill(&tags);
        store.insert(entry, &ticket)
    }

    #[test]
    fn stores_and_returns_unexpired_entries() {
        let store = store_with_capacity(8);
        let now = OffsetDateTime::now_utc();
        let stored = entry("getClientList-1-3", &[Tag::CLIENTS], now + Duration::minutes(10));

        assert_eq!(put(&store, stored.clone()), InsertOutcome::Stored);
        assert_eq!(store.get("getClientList-1-3", now), Some(stored));
        assert!(store.get("getClientList-2-3", now).is_none());
    }

    #[test]
    fn expired_entry_is_dropped_on_read() {
        let store = store_with_capacity(8);
        let now = OffsetDateTime::now_utc();
        put(&store, entry("k", &[Tag::PHONES], now + Duration::seconds(5)));

        assert!(store.get("k", now + Duration::seconds(5)).is_none());
        assert!(store.is_empty());
        assert_eq!(store.indexed_keys(), 0);
    }

    #[test]
    fn invalidation_drops_every_tagged_entry() {
        let store = store_with_capacity(8);
        let now = OffsetDateTime::now_utc();
        let later = now + Duration::minutes(10);
        put(&store, entry("getClientList-1-3", &[Tag::CLIENTS], later));
        put(&store, entry("getClientList-2-3", &[Tag::CLIENTS], later));
        put(&store, entry("getPhoneList-1-3", &[Tag::PHONES], later));

        assert_eq!(store.invalidate_tags(&[Tag::CLIENTS]), 2);
        assert!(store.get("getClientList-1-3", now).is_none());
        assert!(store.get("getPhoneList-1-3", now).is_some());

        assert_eq!(store.invalidate_tags(&[Tag::CLIENTS]), 0);
        assert_eq!(store.invalidate_tags(&[Tag::new("unknownCache")]), 0);
    }

    #[test]
    fn fill_raced_by_invalidation_is_discarded() {
        let store = store_with_capacity(8);
        let now = OffsetDateTime::now_utc();
        let ticket = store.begin_fill(&[Tag::CUSTOMERS]);

        store.invalidate_tags(&[Tag::CUSTOMERS]);

        let outcome = store.insert(
            entry("getCustomerList-1-3", &[Tag::CUSTOMERS], now + Duration::minutes(10)),
            &ticket,
        );
        assert_eq!(outcome, InsertOutcome::Discarded);
        assert!(store.is_empty());
    }

    #[test]
    fn lru_eviction_leaves_tag_index() {
        let store = store_with_capacity(2);
        let later = OffsetDateTime::now_utc() + Duration::minutes(10);
        put(&store, entry("a", &[Tag::PHONES], later));
        put(&store, entry("b", &[Tag::PHONES], later));

        let outcome = put(&store, entry("c", &[Tag::CLIENTS], later));
        assert_eq!(outcome, InsertOutcome::StoredWithEviction("a".into()));
        assert_eq!(store.len(), 2);
        assert_eq!(store.indexed_keys(), 2);
        assert_eq!(store.invalidate_tags(&[Tag::PHONES]), 1);
    }

    #[test]
    fn replacing_a_key_is_not_an_eviction() {
        let store = store_with_capacity(2);
        let later = OffsetDateTime::now_utc() + Duration::minutes(10);
        put(&store, entry("a", &[Tag::PHONES], later));

        assert_eq!(put(&store, entry("a", &[Tag::CLIENTS], later)), InsertOutcome::Stored);
        assert_eq!(store.len(), 1);
        assert_eq!(store.invalidate_tags(&[Tag::PHONES]), 0);
        assert_eq!(store.invalidate_tags(&[Tag::CLIENTS]), 1);
    }

    #[test]
    fn purge_expired_keeps_fresh_entries() {
        let store = store_with_capacity(8);
        let now = OffsetDateTime::now_utc();
        put(&store, entry("old", &[Tag::PHONES], now - Duration::seconds(1)));
        put(&store, entry("fresh", &[Tag::PHONES], now + Duration::minutes(1)));

        assert_eq!(store.purge_expired(now), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.indexed_keys(), 1);
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = store_with_capacity(8);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.inner.lock().expect("store lock should be acquired");
            panic!("poison store lock");
        }));

        let later = OffsetDateTime::now_utc() + Duration::minutes(1);
        assert_eq!(put(&store, entry("k", &[Tag::PHONES], later)), InsertOutcome::Stored);
        assert_eq!(store.len(), 1);
    }
}
