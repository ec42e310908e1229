//! The rules engine (component C2, spec §4.2): `create`, `make_move`,
//! `end_game`, `try_to_lose_by_time`. Pure functions over a `Game` — no I/O,
//! no wall-clock reads beyond the `now` each caller supplies.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::constants::COLUMNS;
use super::game::{ChipLocation, ChipType, CommunicationType, Game, GameStatus, PlayerState};
use super::ids::{GameId, GameStateId, UserId};
use super::{Board, ClockDuration};

/// The four run-detection axes of spec §4.2: horizontal, vertical, and
/// both diagonals.
const WIN_DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
const WIN_RUN_LENGTH: usize = 4;

/// Parameters for one side of a fresh game; mirrors the `{id, time,
/// communication_type}` shape of spec §6's inbound `CreateGame` payload.
#[derive(Debug, Clone, Copy)]
pub struct NewPlayer {
    pub id: UserId,
    pub time_left: ClockDuration,
    pub communication_type: CommunicationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejectionReason {
    GameIsEnded,
    OtherPlayerTurn,
    IllegalMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    MoveAccepted(ChipLocation),
    MoveRejected(MoveRejectionReason),
    Win(ChipLocation),
    Draw(ChipLocation),
    LossByTime(ChipLocation),
}

/// `create(gameId, firstPlayer, secondPlayer, createdAt, lastGame?)` of
/// spec §4.2. When `last_game` is given, each player inherits the
/// *other* player's chip from it (color swap between consecutive
/// meetings, spec scenario 6).
pub fn create(
    game_id: GameId,
    first_player: NewPlayer,
    second_player: NewPlayer,
    created_at: DateTime<Utc>,
    last_game: Option<&Game>,
) -> Game {
    let (first_chip, second_chip) = match last_game {
        None => (ChipType::First, ChipType::Second),
        Some(prev) => (
            prev.player(first_player.id)
                .map(|p| p.chip_type.opponent())
                .unwrap_or(ChipType::First),
            prev.player(second_player.id)
                .map(|p| p.chip_type.opponent())
                .unwrap_or(ChipType::Second),
        ),
    };

    let mut players = IndexMap::new();
    players.insert(
        first_player.id,
        PlayerState {
            chip_type: first_chip,
            time_left: first_player.time_left,
            communication_type: first_player.communication_type,
        },
    );
    players.insert(
        second_player.id,
        PlayerState {
            chip_type: second_chip,
            time_left: second_player.time_left,
            communication_type: second_player.communication_type,
        },
    );

    let current_turn = *players
        .iter()
        .find(|(_, state)| state.chip_type == ChipType::First)
        .map(|(id, _)| id)
        .expect("exactly one player holds ChipType::First");

    Game {
        id: game_id,
        state_id: GameStateId::new(),
        status: GameStatus::NotStarted,
        players,
        current_turn,
        board: Board::empty(),
        last_move_made_at: None,
        created_at,
    }
}

/// `makeMove(game, currentPlayerId, column)` of spec §4.2. Mutates
/// `game` in place and returns the outcome.
pub fn make_move(game: &mut Game, current_player_id: UserId, column: usize, now: DateTime<Utc>) -> MoveResult {
    if !game.players.contains_key(&current_player_id) {
        panic!("make_move called with a player id not in this game");
    }

    if game.status == GameStatus::Ended {
        return MoveResult::MoveRejected(MoveRejectionReason::GameIsEnded);
    }
    if game.current_turn != current_player_id {
        return MoveResult::MoveRejected(MoveRejectionReason::OtherPlayerTurn);
    }
    if column >= COLUMNS {
        return MoveResult::MoveRejected(MoveRejectionReason::IllegalMove);
    }

    let Some(row) = game.board.lowest_empty_row(column) else {
        return MoveResult::MoveRejected(MoveRejectionReason::IllegalMove);
    };
    let loc = ChipLocation { row, column };

    let was_not_started = game.status == GameStatus::NotStarted;
    if was_not_started {
        game.last_move_made_at = Some(now);
    } else {
        let last = game
            .last_move_made_at
            .expect("InProgress game always has a last move timestamp");
        let elapsed = (now - last).to_std().unwrap_or_default();
        let time_left = game
            .player(current_player_id)
            .expect("validated above")
            .time_left;
        if elapsed >= time_left.as_std() {
            game.player_mut(current_player_id).unwrap().time_left = ClockDuration::ZERO;
            game.last_move_made_at = Some(now);
            game.state_id = GameStateId::new();
            game.status = GameStatus::Ended;
            return MoveResult::LossByTime(loc);
        }
        game.player_mut(current_player_id).unwrap().time_left = time_left.saturating_sub(elapsed);
        game.last_move_made_at = Some(now);
    }

    game.state_id = GameStateId::new();
    let chip = game.player(current_player_id).unwrap().chip_type;
    game.board.set(row, column, chip);

    if was_not_started {
        game.status = GameStatus::InProgress;
        game.current_turn = game.other_player(current_player_id);
        return MoveResult::MoveAccepted(loc);
    }

    let is_win = WIN_DIRECTIONS
        .iter()
        .any(|&(dr, dc)| game.board.run_length(row, column, dr, dc) >= WIN_RUN_LENGTH);
    if is_win {
        game.status = GameStatus::Ended;
        return MoveResult::Win(loc);
    }

    if game.board.is_full() {
        game.status = GameStatus::Ended;
        return MoveResult::Draw(loc);
    }

    game.current_turn = game.other_player(current_player_id);
    MoveResult::MoveAccepted(loc)
}

/// `endGame(game)` of spec §4.2. Clocks untouched.
pub fn end_game(game: &mut Game) {
    game.state_id = GameStateId::new();
    game.status = GameStatus::Ended;
}

/// `tryToLoseByTime(game, expectedStateId)` of spec §4.2. Returns `false`
/// (no mutation) when `expected_state_id` no longer matches — the stale
/// task no-op of spec §7/§8 (I8).
pub fn try_to_lose_by_time(game: &mut Game, expected_state_id: GameStateId) -> bool {
    if game.state_id != expected_state_id {
        return false;
    }
    game.state_id = GameStateId::new();
    game.status = GameStatus::Ended;
    if let Some(state) = game.player_mut(game.current_turn) {
        state.time_left = ClockDuration::ZERO;
    }
    true
}
