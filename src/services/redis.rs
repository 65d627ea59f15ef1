//! Redis relay for cache invalidations between server instances

use redis::{AsyncCommands, Client};
use tokio::task::JoinHandle;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use super::invalidation::{InvalidationBus, InvalidationEvent};
use crate::{
    config::RedisConfig,
    error::{AppError, AppResult},
};

/// Events published by this instance. Events applied from other instances
/// are left out so they never bounce back to the channel.
fn outbound_events(bus: &InvalidationBus) -> impl Stream<Item = InvalidationEvent> {
    let own = Some(bus.instance_id());
    BroadcastStream::new(bus.subscribe()).filter_map(move |item| match item {
        Ok(event) if event.origin == own => Some(event),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Invalidation relay lagging: {}", e);
            None
        }
    })
}

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    channel: String,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(config: &RedisConfig) -> AppResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            client,
            channel: config.invalidation_channel.clone(),
        })
    }

    /// Publish an invalidation event for the other instances
    pub async fn publish_invalidation(&self, event: &InvalidationEvent) -> AppResult<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("Failed to encode invalidation event: {}", e)))?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to publish invalidation: {}", e)))?;
        Ok(())
    }

    /// Apply invalidations published on the channel by other instances or upstream systems
    async fn listen(&self, bus: &InvalidationBus) -> AppResult<()> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open Redis pub/sub: {}", e)))?;
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to subscribe to {}: {}", self.channel, e)))?;

        tracing::info!("Subscribed to {}", self.channel);

        let mut messages = pubsub.on_message();
        while let Some(msg) = messages.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("Unreadable invalidation payload: {}", e);
                    continue;
                }
            };
            match serde_json::from_str::<InvalidationEvent>(&payload) {
                Ok(event) => {
                    bus.apply_remote(event).await;
                }
                Err(e) => tracing::warn!(payload = %payload, "Invalid invalidation event: {}", e),
            }
        }
        Ok(())
    }

    /// Forward events published by this instance to Redis
    async fn forward(&self, bus: &InvalidationBus) {
        let events = outbound_events(bus);
        tokio::pin!(events);
        while let Some(event) = events.next().await {
            if let Err(e) = self.publish_invalidation(&event).await {
                tracing::error!("Invalidation not relayed to other instances: {}", e);
            }
        }
    }

    /// Spawn the inbound listener and the outbound forwarder
    pub fn spawn_relay(self, bus: InvalidationBus) -> (JoinHandle<()>, JoinHandle<()>) {
        let inbound = {
            let service = self.clone();
            let bus = bus.clone();
            tokio::spawn(async move {
                if let Err(e) = service.listen(&bus).await {
                    tracing::error!("Invalidation listener stopped: {}", e);
                }
            })
        };
        let outbound = tokio::spawn(async move { self.forward(&bus).await });
        (inbound, outbound)
    }
}
