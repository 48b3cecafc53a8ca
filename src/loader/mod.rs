//! Step data loading.
//!
//! A step whose cards come from outside the wizard (the class list, the
//! subclasses of the chosen class) is fed through a [`StepLoader`]. This
//! module provides the loader contract and two building blocks:
//!
//! - [`CardSource`]: the raw fetch, typically an HTTP client
//! - [`CachedLoader`]: a [`StepLoader`] that caches a [`CardSource`] per key
//! - [`MemoryCardSource`]: an in-memory source for testing and development
//!
//! # Example
//!
//! ```
//! use waymark::{Card, CardType, CachedLoader, LoadKey, MemoryCardSource, StepId, StepLoader};
//!
//! # async fn example() -> Result<(), waymark::LoadError> {
//! let source = MemoryCardSource::new();
//! source
//!     .insert(LoadKey::root(StepId::Class), vec![Card::new(1, "Warrior", CardType::Class)])
//!     .await;
//!
//! let loader = CachedLoader::new(source.clone());
//! let cards = loader.load(&LoadKey::root(StepId::Class)).await?;
//! assert_eq!(cards.len(), 1);
//!
//! // Served from the cache the second time.
//! loader.load(&LoadKey::root(StepId::Class)).await?;
//! assert_eq!(source.fetch_count().await, 1);
//! # Ok(())
//! # }
//! ```

mod cached;
mod memory;

pub use cached::{CacheEntry, CachedLoader};
pub use memory::MemoryCardSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{Card, CardId, LoadError, StepId};

/// Identifies one list of selectable cards.
///
/// The key includes the card chosen on the step this step depends on, so a
/// subclass list loaded for one class is never reused for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadKey {
    /// The step whose cards are loaded.
    pub step: StepId,
    /// The upstream card the list is filtered by, if any.
    pub upstream: Option<CardId>,
}

impl LoadKey {
    /// A key for a step whose cards do not depend on another choice.
    pub fn root(step: StepId) -> Self {
        Self {
            step,
            upstream: None,
        }
    }

    /// A key for a step whose cards are filtered by an upstream card.
    pub fn dependent(step: StepId, upstream: CardId) -> Self {
        Self {
            step,
            upstream: Some(upstream),
        }
    }
}

impl fmt::Display for LoadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upstream {
            Some(upstream) => write!(f, "{}@{}", self.step, upstream),
            None => write!(f, "{}", self.step),
        }
    }
}

/// Supplies the selectable cards for a step.
///
/// Implementations must cache successful results per key for the rest of
/// the session and report failures as values.
///
/// # Object Safety
///
/// This trait is object-safe; the wizard session holds an
/// `Arc<dyn StepLoader>`.
#[async_trait]
pub trait StepLoader: Send + Sync {
    /// Loads the cards for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the cards cannot be obtained.
    async fn load(&self, key: &LoadKey) -> Result<Arc<[Card]>, LoadError>;

    /// Drops every cached entry.
    async fn clear_cache(&self);
}

/// Fetches cards without caching.
///
/// This is the seam to the outside world: an HTTP client that calls the
/// card catalog API and maps the payload with [`crate::mapper`].
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Fetches the cards for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the fetch fails.
    async fn fetch(&self, key: &LoadKey) -> Result<Vec<Card>, LoadError>;
}

#[async_trait]
impl<T: CardSource + ?Sized> CardSource for Arc<T> {
    async fn fetch(&self, key: &LoadKey) -> Result<Vec<Card>, LoadError> {
        (**self).fetch(key).await
    }
}
