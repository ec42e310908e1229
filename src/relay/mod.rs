//! RealtimeRelay (component C6, spec §4.6): best-effort, retried
//! publication to per-game/per-lobby channels for live clients.

mod centrifugo;

pub use centrifugo::CentrifugoRelay;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not serialize relay payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("relay publish failed after exhausting retries: {0}")]
    Exhausted(String),
}

#[async_trait]
pub trait RealtimeRelay: Send + Sync {
    /// Posts `payload` to `channel`. Retries with exponential backoff
    /// (base 0.5s, cap 10s, up to 20 attempts — spec §4.6) before
    /// surfacing a terminal `RelayError::Exhausted`.
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), RelayError>;
}
