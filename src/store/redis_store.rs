//! `GameStore` backed by Redis (spec §6 "Durable store key layout").
//!
//! Grounded on `original_source/infrastructure/database/{game_mapper,
//! redis_}.py`: the game record key embeds both the game id and the
//! sorted player-id pair so that a pair lookup is a prefix/suffix scan,
//! and writes land via a single pipeline at commit time.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;

use crate::domain::{Game, GameId, UserId};

use super::{lock, GameStore, SortBy, StoreError};

pub struct RedisGameStore {
    pool: bb8::Pool<RedisConnectionManager>,
    game_expires_in: Duration,
    lock_expires_in: Duration,
    pending_writes: Vec<Game>,
    locked_games: Vec<GameId>,
}

impl RedisGameStore {
    pub fn new(
        pool: bb8::Pool<RedisConnectionManager>,
        game_expires_in: Duration,
        lock_expires_in: Duration,
    ) -> Self {
        Self {
            pool,
            game_expires_in,
            lock_expires_in,
            pending_writes: Vec::new(),
            locked_games: Vec::new(),
        }
    }

    fn game_key(game_id: GameId, pair: [UserId; 2]) -> String {
        format!(
            "games:id:{}:player_ids:{}:{}",
            game_id.hex(),
            pair[0].hex(),
            pair[1].hex()
        )
    }

    fn game_id_pattern(game_id: GameId) -> String {
        format!("games:id:{}:player_ids:*", game_id.hex())
    }

    fn pair_pattern(pair: [UserId; 2]) -> String {
        format!("games:id:*:player_ids:{}:{}", pair[0].hex(), pair[1].hex())
    }

    async fn scan_keys(
        conn: &mut redis::aio::MultiplexedConnection,
        pattern: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next_cursor, mut batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(conn)
                .await?;
            keys.append(&mut batch);
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }
        Ok(keys)
    }

    async fn fetch_game(
        conn: &mut redis::aio::MultiplexedConnection,
        key: &str,
    ) -> Result<Option<Game>, StoreError> {
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl GameStore for RedisGameStore {
    async fn by_id(&mut self, id: GameId, acquire_lock: bool) -> Result<Option<Game>, StoreError> {
        let mut conn = self.pool.get().await?;

        if acquire_lock && !self.locked_games.contains(&id) {
            lock::acquire(&mut conn, id, self.lock_expires_in).await?;
            self.locked_games.push(id);
        }

        let keys = Self::scan_keys(&mut conn, &Self::game_id_pattern(id)).await?;
        match keys.len() {
            0 => Ok(None),
            1 => Self::fetch_game(&mut conn, &keys[0]).await,
            _ => Err(StoreError::AmbiguousGameId(id)),
        }
    }

    async fn list_by_player_ids(
        &mut self,
        pair: [UserId; 2],
        sort_by: Option<SortBy>,
        limit: usize,
    ) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.pool.get().await?;
        let keys = Self::scan_keys(&mut conn, &Self::pair_pattern(pair)).await?;

        let mut games = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(game) = Self::fetch_game(&mut conn, key).await? {
                games.push(game);
            }
        }

        if sort_by == Some(SortBy::DescCreatedAt) {
            games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        if limit > 0 {
            games.truncate(limit);
        }
        Ok(games)
    }

    fn save(&mut self, game: Game) {
        self.pending_writes.push(game);
    }

    fn update(&mut self, game: Game) {
        self.pending_writes.push(game);
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let ttl_secs = self.game_expires_in.as_secs();

        for game in self.pending_writes.drain(..) {
            let pair = game.player_pair_sorted();
            let key = Self::game_key(game.id, pair);
            let value = serde_json::to_string(&game)?;
            let _: () = conn.set_ex(key, value, ttl_secs).await?;
        }

        for game_id in self.locked_games.drain(..) {
            lock::release(&mut conn, game_id).await?;
        }

        Ok(())
    }
}
