//! `EventBus` backed by NATS JetStream, publishing onto the unified
//! `games` stream (spec §9: "the latest coherent revision uses a
//! unified games stream with fully qualified subjects").
//!
//! Grounded on `original_source/infrastructure/message_broker/
//! {event_publisher,stream_creator,config}.py`.

use async_trait::async_trait;
use async_nats::jetstream::{self, stream::Config as StreamConfig};

use super::{BusError, EventBus};
use crate::events::Event;

pub const STREAM_NAME: &str = "games";

/// The full subject set of spec §6 plus §11: egress subjects this
/// engine publishes on, and the ingress subjects (`connection_hub.*`,
/// `api_gateway.*`) it consumes from, all multiplexed onto one stream.
pub const SUBJECTS: &[&str] = &[
    "connect_four.game.created",
    "connect_four.game.ended",
    "connect_four.game.move_accepted",
    "connect_four.game.move_rejected",
    "connection_hub.connect_four.game.created",
    "connection_hub.connect_four.game.player_disqualified",
    "api_gateway.connect_four.game.move_was_made",
];

pub struct NatsEventBus {
    jetstream: jetstream::Context,
}

impl NatsEventBus {
    pub async fn connect(nats_url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(nats_url).await?;
        let jetstream = jetstream::new(client);
        Ok(Self { jetstream })
    }

    /// Idempotently ensures the `games` stream exists with its full
    /// subject list. A durable consumer cannot attach to a stream that
    /// was never declared (spec §11 "NATS stream provisioning").
    pub async fn ensure_stream(&self) -> Result<(), BusError> {
        self.jetstream
            .get_or_create_stream(StreamConfig {
                name: STREAM_NAME.to_string(),
                subjects: SUBJECTS.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Stream(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn publish(&self, event: &Event) -> Result<(), BusError> {
        let payload = serde_json::to_vec(event)?;
        self.jetstream
            .publish(event.subject().to_string(), payload.into())
            .await?
            .await
            .map_err(|e| BusError::Stream(e.to_string()))?;
        Ok(())
    }
}
