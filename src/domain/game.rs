//! Plain data types for a single Connect Four game (spec §3, component C1).
//!
//! No methods beyond field access and tiny accessors live here; the
//! transition functions that mutate a `Game` live in `domain::rules`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::duration::ClockDuration;
use super::ids::{GameId, GameStateId, LobbyId, UserId};

/// Which side a player places chips as. Unique across the two players
/// in a game (invariant I1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipType {
    First,
    Second,
}

impl ChipType {
    pub fn opponent(self) -> ChipType {
        match self {
            ChipType::First => ChipType::Second,
            ChipType::Second => ChipType::First,
        }
    }
}

/// How a player's client receives realtime pushes. `Relay` gates
/// `RealtimeRelay` publication (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationType {
    Relay,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub chip_type: ChipType,
    pub time_left: ClockDuration,
    pub communication_type: CommunicationType,
}

/// A single cell reference. `row`/`column` are bounds-checked by callers
/// against `ROWS`/`COLUMNS`; this type carries no validation of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipLocation {
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub state_id: GameStateId,
    pub status: GameStatus,
    /// Exactly two entries; insertion order is first/second (spec I1).
    pub players: IndexMap<UserId, PlayerState>,
    pub current_turn: UserId,
    pub board: Board,
    pub last_move_made_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn player(&self, id: UserId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: UserId) -> Option<&mut PlayerState> {
        self.players.get_mut(&id)
    }

    pub fn other_player(&self, id: UserId) -> UserId {
        self.players
            .keys()
            .copied()
            .find(|&k| k != id)
            .expect("game always has exactly two players")
    }

    /// Unordered pair of the two player ids, sorted ascending by hex —
    /// matches the storage key layout of spec §6.
    pub fn player_pair_sorted(&self) -> [UserId; 2] {
        let mut ids: Vec<UserId> = self.players.keys().copied().collect();
        ids.sort_by_key(|id| id.hex());
        [ids[0], ids[1]]
    }
}
