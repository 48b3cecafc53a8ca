//! In-memory card source.
//!
//! This module provides [`MemoryCardSource`], a thread-safe in-memory
//! implementation of [`CardSource`] suitable for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CardSource, LoadKey};
use crate::{Card, LoadError};

/// Internal storage for the memory card source.
#[derive(Debug, Default)]
struct Storage {
    /// Card lists indexed by key.
    cards: HashMap<LoadKey, Vec<Card>>,
    /// Keys that fail with the given message.
    failures: HashMap<LoadKey, String>,
    /// Number of fetches per key.
    fetches: HashMap<LoadKey, usize>,
}

/// An in-memory implementation of [`CardSource`].
///
/// Uses `Arc<RwLock<...>>` internally, so clones share the same data and
/// fetch counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryCardSource {
    storage: Arc<RwLock<Storage>>,
}

impl MemoryCardSource {
    /// Creates a new, empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cards returned for `key`, clearing any failure for it.
    pub async fn insert(&self, key: LoadKey, cards: Vec<Card>) {
        let mut storage = self.storage.write().await;
        storage.failures.remove(&key);
        storage.cards.insert(key, cards);
    }

    /// Makes fetches for `key` fail with `message`.
    pub async fn fail(&self, key: LoadKey, message: impl Into<String>) {
        self.storage
            .write()
            .await
            .failures
            .insert(key, message.into());
    }

    /// Returns the total number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.storage.read().await.fetches.values().sum()
    }

    /// Returns the number of fetches performed for `key`.
    pub async fn fetches_for(&self, key: &LoadKey) -> usize {
        self.storage
            .read()
            .await
            .fetches
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Clears all stored data and counters.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.cards.clear();
        storage.failures.clear();
        storage.fetches.clear();
    }
}

#[async_trait]
impl CardSource for MemoryCardSource {
    async fn fetch(&self, key: &LoadKey) -> Result<Vec<Card>, LoadError> {
        let mut storage = self.storage.write().await;
        *storage.fetches.entry(*key).or_default() += 1;

        if let Some(message) = storage.failures.get(key) {
            return Err(LoadError::Unavailable {
                key: *key,
                message: message.clone(),
            });
        }

        storage
            .cards
            .get(key)
            .cloned()
            .ok_or(LoadError::Unsupported(*key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardType, StepId};

    #[tokio::test]
    async fn test_new_source_is_empty() {
        let source = MemoryCardSource::new();
        assert_eq!(source.fetch_count().await, 0);
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let source = MemoryCardSource::new();
        let key = LoadKey::root(StepId::Class);
        source
            .insert(key, vec![Card::new(1, "Warrior", CardType::Class)])
            .await;

        let cards = source.fetch(&key).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(source.fetches_for(&key).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_key_is_unsupported() {
        let source = MemoryCardSource::new();
        let err = source
            .fetch(&LoadKey::root(StepId::Ancestry))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(_)));
        assert_eq!(source.fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_failure_then_recovery() {
        let source = MemoryCardSource::new();
        let key = LoadKey::dependent(StepId::Subclass, 1);
        source.fail(key, "timeout").await;

        let err = source.fetch(&key).await.unwrap_err();
        assert_eq!(
            err,
            LoadError::Unavailable {
                key,
                message: "timeout".to_string()
            }
        );

        source.insert(key, Vec::new()).await;
        assert!(source.fetch(&key).await.unwrap().is_empty());
        assert_eq!(source.fetches_for(&key).await, 2);
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let source = MemoryCardSource::new();
        let clone = source.clone();
        let _ = clone.fetch(&LoadKey::root(StepId::Class)).await;
        assert_eq!(source.fetch_count().await, 1);

        source.clear().await;
        assert_eq!(clone.fetch_count().await, 0);
    }
}
