//! TaskScheduler (component C4, spec §4.4): idempotent register/cancel
//! of future "lose-by-time" tasks, keyed by game-state version.

mod redis_scheduler;

pub use redis_scheduler::RedisTaskScheduler;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{GameId, GameStateId};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<redis::RedisError>),

    #[error("could not serialize task payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// `TryToLoseByTimeTask` of spec §3. `id` MUST be
/// `"try_to_lose_by_time:" + game_state_id.hex()` (spec §4.4 protocol
/// with C2) so rescheduling under a fresh state id can never collide
/// with the task it superseded.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub execute_at: DateTime<Utc>,
    pub game_id: GameId,
    pub game_state_id: GameStateId,
    pub operation_id: Uuid,
}

impl Task {
    pub fn try_to_lose_by_time(
        game_id: GameId,
        game_state_id: GameStateId,
        execute_at: DateTime<Utc>,
        operation_id: Uuid,
    ) -> Self {
        Self {
            id: task_id(game_state_id),
            execute_at,
            game_id,
            game_state_id,
            operation_id,
        }
    }
}

pub fn task_id(game_state_id: GameStateId) -> String {
    format!("try_to_lose_by_time:{}", game_state_id.hex())
}

/// A task that has crossed its `execute_at` and is ready for the
/// TaskRunner (C8) to act on.
#[derive(Debug, Clone)]
pub struct FiredTask {
    pub game_id: GameId,
    pub game_state_id: GameStateId,
    pub operation_id: Uuid,
}

#[async_trait]
pub trait TaskScheduler: Send + Sync {
    /// Upserts by task id: an existing entry with the same id is
    /// replaced (spec §4.4).
    async fn schedule(&self, task: Task) -> Result<(), SchedulerError>;

    /// Idempotent; a missing id is not an error (spec §4.4).
    async fn unschedule(&self, task_id: &str) -> Result<(), SchedulerError>;

    /// Moves every task whose `execute_at` has passed into the fired
    /// queue `run-scheduler` drains into (maps to
    /// `infrastructure/scheduling/task_scheduler.py`'s poll loop).
    async fn promote_due(&self, now: DateTime<Utc>) -> Result<usize, SchedulerError>;

    /// Pops up to `max` fired tasks for the TaskRunner (C8) to consume.
    async fn drain_fired(&self, max: usize) -> Result<Vec<FiredTask>, SchedulerError>;
}
