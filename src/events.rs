//! Wire-shape types for the bus (C5 egress, spec §6) and the realtime
//! relay (C6, spec §11 "Centrifugo publication shape").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ChipLocation, ChipType, ClockDuration, GameId, LobbyId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    Win,
    Draw,
    LossByTime,
}

/// Inbound command payloads (spec §6 ingress table). One per subject.
pub mod ingress {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct NewPlayerPayload {
        pub id: UserId,
        pub time: ClockDuration,
        pub communication_type: crate::domain::CommunicationType,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CreateGame {
        pub game_id: GameId,
        pub lobby_id: LobbyId,
        pub first_player: NewPlayerPayload,
        pub second_player: NewPlayerPayload,
        pub created_at: DateTime<Utc>,
        pub operation_id: Uuid,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct EndGame {
        pub game_id: GameId,
        pub operation_id: Uuid,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MakeMove {
        pub current_user_id: UserId,
        pub game_id: GameId,
        pub column: usize,
        pub operation_id: Uuid,
    }
}

/// Outbound domain events (spec §6 egress table). Every payload carries
/// the originating command's `operation_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "game_created")]
    GameCreated {
        game_id: GameId,
        lobby_id: LobbyId,
        operation_id: Uuid,
    },
    #[serde(rename = "move_accepted")]
    MoveAccepted {
        game_id: GameId,
        current_user_id: UserId,
        chip_location: ChipLocation,
        operation_id: Uuid,
    },
    #[serde(rename = "move_rejected")]
    MoveRejected {
        game_id: GameId,
        current_user_id: UserId,
        reason: crate::domain::MoveRejectionReason,
        operation_id: Uuid,
    },
    #[serde(rename = "game_ended")]
    GameEnded {
        game_id: GameId,
        reason: GameEndReason,
        chip_location: Option<ChipLocation>,
        operation_id: Uuid,
    },
}

impl Event {
    /// Bus subject this event publishes on (spec §6 egress table, under
    /// the unified `games` stream per spec §9's "latest coherent
    /// revision").
    pub fn subject(&self) -> &'static str {
        match self {
            Event::GameCreated { .. } => "connect_four.game.created",
            Event::GameEnded { .. } => "connect_four.game.ended",
            Event::MoveAccepted { .. } => "connect_four.game.move_accepted",
            Event::MoveRejected { .. } => "connect_four.game.move_rejected",
        }
    }

    pub fn game_id(&self) -> GameId {
        match self {
            Event::GameCreated { game_id, .. }
            | Event::MoveAccepted { game_id, .. }
            | Event::MoveRejected { game_id, .. }
            | Event::GameEnded { game_id, .. } => *game_id,
        }
    }
}

/// Serde needs `MoveRejectionReason` to implement `Serialize`; the
/// domain type is kept free of serde so the rules engine stays
/// wire-format agnostic, and the wire shape lives here instead.
impl Serialize for crate::domain::MoveRejectionReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            crate::domain::MoveRejectionReason::GameIsEnded => "game_is_ended",
            crate::domain::MoveRejectionReason::OtherPlayerTurn => "other_player_turn",
            crate::domain::MoveRejectionReason::IllegalMove => "illegal_move",
        };
        serializer.serialize_str(s)
    }
}

/// Per-player view embedded in a realtime relay publication, matching
/// `infrastructure/clients/centrifugo.py`'s field-for-field shape
/// (chip type + remaining time per player).
#[derive(Debug, Clone, Serialize)]
pub struct RelayPlayerView {
    pub chip_type: ChipType,
    pub time_left: ClockDuration,
}

type RelayPlayers = std::collections::HashMap<String, RelayPlayerView>;

/// Realtime relay publication payloads (`C6`), field-for-field with
/// `original_source/connect_four/infrastructure/clients/centrifugo.py`'s
/// `_publish_*` methods, which build a distinct dict shape per event
/// rather than one uniform envelope: `game_created` carries `game_id` +
/// `current_turn` but no `move`; `move_accepted`/`move_rejected` carry
/// `move` + `current_turn` but no `last_turn`; `game_ended` carries
/// `move` + `last_turn` but no `game_id`/`current_turn`. The `"type"`
/// discriminator is embedded in the published `data`, not a sibling of
/// it, matching `event_as_dict["type"] = ...` there.
///
/// `move_rejected`'s `move` is always `None` here: this crate's
/// `MoveRejected` (spec §3, the committed revision per spec §9 Design
/// Notes) resolves rejection before any chip location is computed, so
/// unlike the original there is no location to report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum RelayPayload {
    #[serde(rename = "game_created")]
    GameCreated {
        game_id: GameId,
        players: RelayPlayers,
        current_turn: String,
    },
    #[serde(rename = "move_accepted")]
    MoveAccepted {
        #[serde(rename = "move")]
        location: ChipLocation,
        players: RelayPlayers,
        current_turn: String,
    },
    #[serde(rename = "move_rejected")]
    MoveRejected {
        #[serde(rename = "move")]
        location: Option<ChipLocation>,
        reason: crate::domain::MoveRejectionReason,
        players: RelayPlayers,
        current_turn: String,
    },
    #[serde(rename = "game_ended")]
    GameEnded {
        #[serde(rename = "move")]
        location: Option<ChipLocation>,
        players: RelayPlayers,
        reason: GameEndReason,
        last_turn: String,
    },
}

pub fn game_channel(game_id: GameId) -> String {
    format!("games:{}", game_id.hex())
}

pub fn lobby_channel(lobby_id: LobbyId) -> String {
    format!("lobbies:{}", lobby_id.hex())
}
