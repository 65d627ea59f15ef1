//! Business logic services

pub mod cache;
pub mod conflicts;
pub mod invalidation;
pub mod inventory;
pub mod redis;
pub mod suggestions;
pub mod usage;
pub mod virtual_stock;

use std::sync::Arc;

use crate::{config::InventoryConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub inventory: inventory::InventoryEngine,
    pub repository: Repository,
    /// Present when invalidations are relayed between instances
    pub redis: Option<redis::RedisService>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        inventory_config: &InventoryConfig,
        redis_service: Option<redis::RedisService>,
    ) -> Self {
        let cache = cache::DerivedCache::new(cache::CachePolicy::from(inventory_config));
        let bus = invalidation::InvalidationBus::new(cache.clone());
        let inventory = inventory::InventoryEngine::new(
            Arc::new(repository.clone()),
            cache,
            bus,
            inventory_config,
        );

        Self {
            inventory,
            repository,
            redis: redis_service,
        }
    }
}
