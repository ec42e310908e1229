//! The game-command engine's domain layer: pure state (`game`, `board`),
//! identifiers, and the transition functions of the rules engine (`rules`).
//! Nothing here performs I/O.

pub mod board;
pub mod constants;
pub mod duration;
pub mod game;
pub mod ids;
pub mod rules;

pub use board::Board;
pub use duration::ClockDuration;
pub use game::{ChipLocation, ChipType, CommunicationType, Game, GameStatus, PlayerState};
pub use ids::{GameId, GameStateId, LobbyId, UserId};
pub use rules::{MoveRejectionReason, MoveResult, NewPlayer};
