//! Invalidation bus: upstream mutations clear derived results before they are acknowledged

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use super::cache::DerivedCache;
use crate::models::InvalidationScope;

const CHANNEL_CAPACITY: usize = 256;

/// A mutation notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvalidationEvent {
    pub scope: InvalidationScope,
    /// Equipment touched by the mutation, when known
    #[serde(default)]
    pub equipment_id: Option<Uuid>,
    /// Server instance that published the event; absent for external publishers
    #[serde(default)]
    pub origin: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct InvalidationBus {
    cache: DerivedCache,
    sender: broadcast::Sender<InvalidationEvent>,
    instance_id: Uuid,
}

impl InvalidationBus {
    pub fn new(cache: DerivedCache) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            cache,
            sender,
            instance_id: Uuid::new_v4(),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Clear the local cache, then notify subscribers.
    /// The cache is already empty when this returns.
    pub async fn publish(&self, scope: InvalidationScope, equipment_id: Option<Uuid>) -> InvalidationEvent {
        let event = InvalidationEvent {
            scope,
            equipment_id,
            origin: Some(self.instance_id),
        };
        self.cache.invalidate(scope).await;
        // No subscriber is not an error
        let _ = self.sender.send(event.clone());
        event
    }

    /// Apply an event received from another instance or an external publisher.
    /// Returns false for our own events echoed back.
    pub async fn apply_remote(&self, event: InvalidationEvent) -> bool {
        if event.origin == Some(self.instance_id) {
            return false;
        }
        self.cache.invalidate(event.scope).await;
        let _ = self.sender.send(event);
        true
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.sender.subscribe()
    }
}
