//! EventBus (component C5, spec §4.5): at-least-once publication of
//! domain events on named subjects within the shared `games` stream.

mod nats_bus;

pub use nats_bus::NatsEventBus;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::Event;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("nats connect error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    #[error("nats publish error: {0}")]
    Publish(#[from] async_nats::jetstream::context::PublishError),

    #[error("nats stream error: {0}")]
    Stream(String),

    #[error("could not serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait EventBus: Send + Sync {
    /// At-least-once. Ordering across subjects is not guaranteed;
    /// ordering within a single game's subject-set is preserved by the
    /// per-game lock serializing the processors that publish (spec §5).
    async fn publish(&self, event: &Event) -> Result<(), BusError>;
}
