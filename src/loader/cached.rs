//! Per-key caching loader.
//!
//! [`CachedLoader`] wraps a [`CardSource`] and keeps every successful
//! result for the rest of the session. Concurrent loads of the same key
//! wait on a per-key gate, so the source is fetched once; loads of
//! different keys proceed independently. A gate lives only while its key is
//! being fetched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{CardSource, LoadKey, StepLoader};
use crate::{Card, LoadError};

/// A cached card list.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cards.
    pub cards: Arc<[Card]>,
    /// When the list was fetched.
    pub cached_at: DateTime<Utc>,
}

/// A [`StepLoader`] that caches a [`CardSource`] per [`LoadKey`].
///
/// Failures are not cached; the next load for the key fetches again. A
/// fetch that was started before [`StepLoader::clear_cache`] returns its
/// cards to the caller but does not store them.
pub struct CachedLoader<S> {
    source: S,
    cache: RwLock<HashMap<LoadKey, CacheEntry>>,
    /// One gate per key, held while that key is being fetched.
    gates: Mutex<HashMap<LoadKey, Arc<Mutex<()>>>>,
    /// Bumped by every cache clear, under the cache write lock.
    generation: AtomicU64,
}

impl<S: CardSource> CachedLoader<S> {
    /// Creates a loader with an empty cache.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the cached entry for `key`.
    pub async fn cached(&self, key: &LoadKey) -> Option<CacheEntry> {
        self.cache.read().await.get(key).cloned()
    }

    /// Returns true if `key` is cached.
    pub async fn is_cached(&self, key: &LoadKey) -> bool {
        self.cache.read().await.contains_key(key)
    }

    /// Returns the number of cached keys.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    async fn gate(&self, key: &LoadKey) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(*key).or_default())
    }

    /// Drops `gate` from the map unless a newer gate replaced it.
    async fn release_gate(&self, key: &LoadKey, gate: &Arc<Mutex<()>>) {
        let mut gates = self.gates.lock().await;
        if gates.get(key).is_some_and(|g| Arc::ptr_eq(g, gate)) {
            gates.remove(key);
        }
    }
}

#[async_trait]
impl<S: CardSource> StepLoader for CachedLoader<S> {
    async fn load(&self, key: &LoadKey) -> Result<Arc<[Card]>, LoadError> {
        if let Some(entry) = self.cached(key).await {
            debug!(key = %key, "cache hit");
            return Ok(entry.cards);
        }

        let gate = self.gate(key).await;
        let _guard = gate.lock().await;

        // Another load may have filled the entry while we waited.
        if let Some(entry) = self.cached(key).await {
            debug!(key = %key, "joined in-flight load");
            self.release_gate(key, &gate).await;
            return Ok(entry.cards);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        debug!(key = %key, "fetching cards");
        let result = self.source.fetch(key).await;

        let result = match result {
            Ok(cards) => {
                let cards: Arc<[Card]> = cards.into();
                let mut cache = self.cache.write().await;
                if self.generation.load(Ordering::SeqCst) == generation {
                    cache.insert(
                        *key,
                        CacheEntry {
                            cards: Arc::clone(&cards),
                            cached_at: Utc::now(),
                        },
                    );
                    debug!(key = %key, count = cards.len(), "cached cards");
                } else {
                    debug!(key = %key, "cache cleared during fetch, not storing");
                }
                Ok(cards)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "card fetch failed");
                Err(e)
            }
        };

        self.release_gate(key, &gate).await;
        result
    }

    async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("card cache cleared");
    }
}

impl<S> std::fmt::Debug for CachedLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedLoader").finish_non_exhaustive()
    }
}
