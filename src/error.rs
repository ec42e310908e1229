//! Typed errors surfaced by the engine (spec §7).
//!
//! `StaleStateId` deliberately has no variant here: a stale
//! `try_to_lose_by_time` firing is a `bool`/`Option` outcome, never an
//! `Err` (see `domain::rules::try_to_lose_by_time` and
//! `processors::try_to_lose_by_time`).

use thiserror::Error;

use crate::domain::GameId;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("game {0} already exists")]
    GameAlreadyExists(GameId),

    #[error("game {0} does not exist")]
    GameDoesNotExist(GameId),

    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("bus error: {0}")]
    Bus(#[from] crate::bus::BusError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] crate::scheduler::SchedulerError),

    #[error("relay error: {0}")]
    Relay(#[from] crate::relay::RelayError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not serialize relay payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
