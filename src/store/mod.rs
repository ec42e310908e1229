//! GameStore (component C3, spec §4.3): durable game-by-id and
//! games-by-player-pair lookup, advisory per-game locking, and batched
//! writes committed atomically.

mod lock;
mod redis_store;

pub use redis_store::RedisGameStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Game, GameId, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<redis::RedisError>),

    #[error("could not serialize game record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("timed out acquiring the per-game lock for {0}")]
    LockTimeout(GameId),

    #[error("more than one stored record matched game id {0}")]
    AmbiguousGameId(GameId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    DescCreatedAt,
}

/// One instance is scoped to a single inbound command; `commit` flushes
/// every enqueued write and releases every lock acquired during the
/// transaction's lifetime (spec §4.3, §5 "Lock protocol").
#[async_trait]
pub trait GameStore: Send {
    async fn by_id(&mut self, id: GameId, acquire_lock: bool) -> Result<Option<Game>, StoreError>;

    async fn list_by_player_ids(
        &mut self,
        pair: [UserId; 2],
        sort_by: Option<SortBy>,
        limit: usize,
    ) -> Result<Vec<Game>, StoreError>;

    /// Enqueues a write for a game that must not already exist. The
    /// `GameAlreadyExists` check itself is the processor's
    /// responsibility (via a preceding `by_id`); this only buffers.
    fn save(&mut self, game: Game);

    /// Enqueues a write for a game that must already exist.
    fn update(&mut self, game: Game);

    /// Atomically flushes every enqueued write and releases every lock
    /// held by this transaction. Must be called exactly once per
    /// command (spec §4.3).
    async fn commit(&mut self) -> Result<(), StoreError>;
}
