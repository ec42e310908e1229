//! Redis-backed advisory lock with TTL (spec §5 "Lock protocol", §11
//! "Redis-backed advisory lock with TTL"). A presence-based key means
//! held; `SET NX PX` acquires, a crashed worker's lock simply expires.

use std::time::Duration;

use redis::AsyncCommands;
use tokio::time::sleep;

use crate::domain::GameId;

use super::StoreError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const MAX_WAIT: Duration = Duration::from_secs(5);

fn lock_key(game_id: GameId) -> String {
    format!("locks:games:id:{}", game_id.hex())
}

/// Blocks (with a bounded poll loop) until the lock is acquired or
/// `MAX_WAIT` elapses.
pub async fn acquire(
    conn: &mut redis::aio::MultiplexedConnection,
    game_id: GameId,
    ttl: Duration,
) -> Result<(), StoreError> {
    let key = lock_key(game_id);
    let deadline = tokio::time::Instant::now() + MAX_WAIT;
    loop {
        let acquired: bool = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<Option<String>>(conn)
            .await
            .map(|v| v.is_some())?;
        if acquired {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(StoreError::LockTimeout(game_id));
        }
        sleep(POLL_INTERVAL).await;
    }
}

pub async fn release(
    conn: &mut redis::aio::MultiplexedConnection,
    game_id: GameId,
) -> Result<(), StoreError> {
    let _: () = conn.del(lock_key(game_id)).await?;
    Ok(())
}
