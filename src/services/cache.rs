//! Derived-result cache for effective stock and conflict results
//!
//! Every entry is stamped with the cache generation current when its
//! computation *started*. Invalidation clears all entries and bumps the
//! generation under one write lock, so readers see either the whole old set
//! or an empty cache, and a computation that raced with an invalidation can
//! not store its (possibly pre-write) result afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    config::InventoryConfig,
    models::{ConflictReport, ConflictScope, DateRange, InvalidationScope, StockReport},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Stock {
        /// Sorted and deduplicated
        equipment_ids: Vec<Uuid>,
        range: DateRange,
    },
    Conflicts(ConflictScope),
}

#[derive(Debug, Clone)]
pub enum CachedResult {
    Stock(Arc<StockReport>),
    Conflicts(Arc<ConflictReport>),
}

/// TTL and size bound. A zero TTL or zero capacity disables caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl From<&InventoryConfig> for CachePolicy {
    fn from(config: &InventoryConfig) -> Self {
        Self {
            ttl: config.cache_ttl(),
            max_entries: config.cache_max_entries,
        }
    }
}

impl CachePolicy {
    fn disabled(&self) -> bool {
        self.ttl.is_zero() || self.max_entries == 0
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedResult,
    generation: u64,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<CacheKey, CacheEntry>,
}

#[derive(Debug, Clone)]
pub struct DerivedCache {
    state: Arc<RwLock<CacheState>>,
    policy: CachePolicy,
}

impl DerivedCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Generation to pass back to [`DerivedCache::insert`]; read it before computing
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CachedResult> {
        {
            let state = self.state.read().await;
            let entry = state.entries.get(key)?;
            if entry.generation == state.generation && entry.stored_at.elapsed() <= self.policy.ttl {
                return Some(entry.value.clone());
            }
        }

        // Expired or stale: drop it so the caller recomputes
        let mut state = self.state.write().await;
        let current = state.generation;
        let verdict = state
            .entries
            .get(key)
            .map(|entry| (entry.generation, entry.stored_at.elapsed() > self.policy.ttl));
        match verdict {
            Some((generation, _)) if generation != current => {
                tracing::error!(
                    entry_generation = generation,
                    current_generation = current,
                    "Stale cache entry survived an invalidation, forcing recomputation"
                );
                state.entries.clear();
            }
            Some((_, true)) => {
                state.entries.remove(key);
            }
            _ => {}
        }
        None
    }

    /// Store a result computed from data read at `generation`.
    /// Returns false when the result was discarded.
    pub async fn insert(&self, key: CacheKey, value: CachedResult, generation: u64) -> bool {
        if self.policy.disabled() {
            return false;
        }

        let mut state = self.state.write().await;
        if generation != state.generation {
            tracing::debug!(
                computed_at = generation,
                current = state.generation,
                "Discarding result computed before an invalidation"
            );
            return false;
        }

        if state.entries.len() >= self.policy.max_entries && !state.entries.contains_key(&key) {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                generation,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every derived result. Coarse on purpose: any upstream write can move
    /// both stock and usage figures. Returns the number of entries removed.
    pub async fn invalidate(&self, scope: InvalidationScope) -> usize {
        let mut state = self.state.write().await;
        let removed = state.entries.len();
        state.entries.clear();
        state.generation += 1;
        tracing::info!(
            scope = %scope,
            removed,
            generation = state.generation,
            "Inventory cache invalidated"
        );
        removed
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn policy() -> CachePolicy {
        CachePolicy {
            ttl: Duration::from_secs(60),
            max_entries: 2,
        }
    }

    fn key(day: u32) -> CacheKey {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        CacheKey::Stock {
            equipment_ids: vec![],
            range: DateRange::single(date),
        }
    }

    fn value() -> CachedResult {
        CachedResult::Stock(Arc::new(StockReport::default()))
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = DerivedCache::new(policy());
        let generation = cache.generation().await;
        assert!(cache.insert(key(1), value(), generation).await);
        assert!(matches!(cache.get(&key(1)).await, Some(CachedResult::Stock(_))));
        assert!(cache.get(&key(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_clears_everything() {
        let cache = DerivedCache::new(policy());
        let generation = cache.generation().await;
        cache.insert(key(1), value(), generation).await;
        cache.insert(key(2), value(), generation).await;

        assert_eq!(cache.invalidate(InvalidationScope::Bookings).await, 2);
        assert!(cache.is_empty().await);
        assert!(cache.get(&key(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_result_computed_before_invalidation_is_discarded() {
        let cache = DerivedCache::new(policy());
        let started_at = cache.generation().await;
        cache.invalidate(InvalidationScope::SubrentalOrders).await;

        assert!(!cache.insert(key(1), value(), started_at).await);
        assert!(cache.get(&key(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_oldest_entry_is_evicted_at_capacity() {
        let cache = DerivedCache::new(policy());
        let generation = cache.generation().await;
        cache.insert(key(1), value(), generation).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert(key(2), value(), generation).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert(key(3), value(), generation).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&key(1)).await.is_none());
        assert!(cache.get(&key(3)).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entries_are_not_served() {
        let cache = DerivedCache::new(CachePolicy {
            ttl: Duration::from_millis(10),
            max_entries: 8,
        });
        let generation = cache.generation().await;
        cache.insert(key(1), value(), generation).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get(&key(1)).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let cache = DerivedCache::new(CachePolicy {
            ttl: Duration::ZERO,
            max_entries: 8,
        });
        assert!(!cache.insert(key(1), value(), 0).await);
        assert!(cache.is_empty().await);
    }
}
