//! `TaskScheduler` backed by a Redis sorted set (the due-time index)
//! plus a hash (task payloads) and a list (the fired queue). Ported
//! from `original_source/infrastructure/scheduling/task_scheduler.py`'s
//! taskiq-over-redis shape — taskiq itself has no Rust counterpart in
//! the retrieval pack, so this is the direct redis-native translation
//! of "upsert by id, fire at `executeAt`."

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use super::{FiredTask, SchedulerError, Task, TaskScheduler};

const SCHEDULE_KEY: &str = "scheduler:try_to_lose_by_time:due";
const PAYLOAD_KEY: &str = "scheduler:try_to_lose_by_time:payload";
const FIRED_QUEUE_KEY: &str = "scheduler:try_to_lose_by_time:fired";

#[derive(Serialize, Deserialize)]
struct TaskPayload {
    game_id: crate::domain::GameId,
    game_state_id: crate::domain::GameStateId,
    operation_id: uuid::Uuid,
}

pub struct RedisTaskScheduler {
    pool: bb8::Pool<RedisConnectionManager>,
}

impl RedisTaskScheduler {
    pub fn new(pool: bb8::Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskScheduler for RedisTaskScheduler {
    async fn schedule(&self, task: Task) -> Result<(), SchedulerError> {
        let mut conn = self.pool.get().await?;
        let payload = serde_json::to_string(&TaskPayload {
            game_id: task.game_id,
            game_state_id: task.game_state_id,
            operation_id: task.operation_id,
        })?;
        let score = task.execute_at.timestamp() as f64;
        let _: () = redis::pipe()
            .atomic()
            .zadd(SCHEDULE_KEY, &task.id, score)
            .hset(PAYLOAD_KEY, &task.id, payload)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn unschedule(&self, task_id: &str) -> Result<(), SchedulerError> {
        let mut conn = self.pool.get().await?;
        let _: () = redis::pipe()
            .atomic()
            .zrem(SCHEDULE_KEY, task_id)
            .hdel(PAYLOAD_KEY, task_id)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn promote_due(&self, now: DateTime<Utc>) -> Result<usize, SchedulerError> {
        let mut conn = self.pool.get().await?;
        let due: Vec<String> = conn
            .zrangebyscore(SCHEDULE_KEY, 0, now.timestamp())
            .await?;

        for task_id in &due {
            let payload: Option<String> = conn.hget(PAYLOAD_KEY, task_id).await?;
            let _: () = conn.zrem(SCHEDULE_KEY, task_id).await?;
            let _: () = conn.hdel(PAYLOAD_KEY, task_id).await?;
            if let Some(payload) = payload {
                let _: () = conn.rpush(FIRED_QUEUE_KEY, payload).await?;
            }
        }
        Ok(due.len())
    }

    async fn drain_fired(&self, max: usize) -> Result<Vec<FiredTask>, SchedulerError> {
        let mut conn = self.pool.get().await?;
        let mut fired = Vec::with_capacity(max);
        for _ in 0..max {
            let raw: Option<String> = conn.lpop(FIRED_QUEUE_KEY, None).await?;
            let Some(raw) = raw else { break };
            let payload: TaskPayload = serde_json::from_str(&raw)?;
            fired.push(FiredTask {
                game_id: payload.game_id,
                game_state_id: payload.game_state_id,
                operation_id: payload.operation_id,
            });
        }
        Ok(fired)
    }
}
