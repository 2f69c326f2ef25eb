//! Read-through cache over a [`TagAwareStore`].
//!
//! On a hit the stored bytes are returned untouched and the compute
//! function is never called. On a miss the compute function runs once; a
//! successful result is stored under its tags with an expiry, a failure is
//! propagated and nothing is stored.
//!
//! Concurrent misses on the same key each compute. Whichever fill lands
//! last wins; a fill whose tags were invalidated while it ran is returned
//! to its caller but not stored.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use metrics::{counter, histogram};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::keys::Tag;
use super::store::{CacheEntry, InsertOutcome, TagAwareStore};

const METRIC_HIT: &str = "bilemo_cache_hit_total";
const METRIC_MISS: &str = "bilemo_cache_miss_total";
const METRIC_FILL_DISCARDED: &str = "bilemo_cache_fill_discarded_total";
const METRIC_FILL_MS: &str = "bilemo_cache_fill_ms";

#[derive(Debug, Error)]
pub enum ReadThroughError<E> {
    /// The compute function failed; nothing was cached.
    #[error(transparent)]
    Compute(E),
    #[error("failed to encode cache payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode cache payload: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn TagAwareStore>,
    enabled: bool,
    default_ttl: Duration,
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn TagAwareStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            enabled: config.enabled,
            default_ttl: config.default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the payload stored under `key`, or compute, store, and return it.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        tags: &[Tag],
        ttl: Duration,
        compute: F,
    ) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, E>>,
    {
        if !self.enabled {
            return compute().await;
        }
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }
        self.fill(key, tags, ttl, compute).await
    }

    /// Typed variant of [`Self::get_or_compute`] storing values as JSON.
    ///
    /// A stored payload that no longer decodes as `T` is dropped and
    /// recomputed.
    pub async fn get_or_compute_json<T, F, Fut, E>(
        &self,
        key: &str,
        tags: &[Tag],
        ttl: Duration,
        compute: F,
    ) -> Result<T, ReadThroughError<E>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            return compute().await.map_err(ReadThroughError::Compute);
        }

        if let Some(bytes) = self.lookup(key) {
            match serde_json::from_slice(&bytes) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(key, %error, "Dropping undecodable cache payload");
                    self.store.remove(key);
                }
            }
        }

        let mut computed: Option<T> = None;
        let slot = &mut computed;
        let bytes = self
            .fill(key, tags, ttl, move || async move {
                let value = compute().await.map_err(ReadThroughError::Compute)?;
                let encoded = serde_json::to_vec(&value).map_err(ReadThroughError::Encode)?;
                *slot = Some(value);
                Ok::<_, ReadThroughError<E>>(Bytes::from(encoded))
            })
            .await?;

        match computed {
            Some(value) => Ok(value),
            None => serde_json::from_slice(&bytes).map_err(ReadThroughError::Decode),
        }
    }

    fn lookup(&self, key: &str) -> Option<Bytes> {
        let entry = self.store.get(key, OffsetDateTime::now_utc());
        match entry {
            Some(entry) => {
                counter!(METRIC_HIT).increment(1);
                debug!(key, "Cache hit");
                Some(entry.value)
            }
            None => {
                counter!(METRIC_MISS).increment(1);
                debug!(key, "Cache miss");
                None
            }
        }
    }

    async fn fill<F, Fut, E>(&self, key: &str, tags: &[Tag], ttl: Duration, compute: F) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, E>>,
    {
        let ticket = self.store.begin_fill(tags);
        let started_at = Instant::now();
        let value = compute().await?;
        histogram!(METRIC_FILL_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        let entry = CacheEntry {
            key: key.to_string(),
            value: value.clone(),
            tags: tags.iter().cloned().collect(),
            expires_at: expiry_after(OffsetDateTime::now_utc(), ttl),
        };
        match self.store.insert(entry, &ticket) {
            InsertOutcome::Discarded => {
                counter!(METRIC_FILL_DISCARDED).increment(1);
                debug!(key, "Cache fill discarded after concurrent invalidation");
            }
            InsertOutcome::StoredWithEviction(evicted) => {
                debug!(key, evicted = %evicted, "Cache fill stored with eviction");
            }
            InsertOutcome::Stored => {}
        }
        Ok(value)
    }
}

fn expiry_after(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
    time::Duration::try_from(ttl)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}
