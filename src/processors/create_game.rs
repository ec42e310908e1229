//! CreateGame processor (spec §4.7 "CreateGame processor").

use crate::domain::rules::{self, NewPlayer};
use crate::error::ApplicationError;
use crate::events::{self, Event, RelayPayload};
use crate::store::{GameStore, SortBy};

use super::{any_player_uses_relay, relay_players, CommandContext};

pub async fn create_game(
    store: &mut dyn GameStore,
    ctx: &CommandContext<'_>,
    cmd: crate::events::ingress::CreateGame,
) -> Result<(), ApplicationError> {
    log::debug!(
        "create_game: entry game_id={} operation_id={}",
        cmd.game_id,
        cmd.operation_id
    );

    if store.by_id(cmd.game_id, true).await?.is_some() {
        return Err(ApplicationError::GameAlreadyExists(cmd.game_id));
    }

    let mut pair = [cmd.first_player.id, cmd.second_player.id];
    pair.sort_by_key(|id| id.hex());
    let last_game = store
        .list_by_player_ids(pair, Some(SortBy::DescCreatedAt), 1)
        .await?
        .into_iter()
        .next();

    let first = NewPlayer {
        id: cmd.first_player.id,
        time_left: cmd.first_player.time,
        communication_type: cmd.first_player.communication_type,
    };
    let second = NewPlayer {
        id: cmd.second_player.id,
        time_left: cmd.second_player.time,
        communication_type: cmd.second_player.communication_type,
    };

    let game = rules::create(cmd.game_id, first, second, cmd.created_at, last_game.as_ref());
    store.save(game.clone());

    ctx.bus
        .publish(&Event::GameCreated {
            game_id: cmd.game_id,
            lobby_id: cmd.lobby_id,
            operation_id: cmd.operation_id,
        })
        .await?;

    if any_player_uses_relay(&game) {
        let payload = RelayPayload::GameCreated {
            game_id: game.id,
            players: relay_players(&game),
            current_turn: game.current_turn.hex(),
        };
        ctx.relay
            .publish(
                &events::lobby_channel(cmd.lobby_id),
                serde_json::to_value(payload)?,
            )
            .await?;
    }

    store.commit().await?;
    log::debug!("create_game: exit game_id={}", cmd.game_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::{ChipType, CommunicationType, GameId, LobbyId, UserId};
    use crate::events::ingress::{CreateGame, NewPlayerPayload};
    use crate::processors::test_support::{MockBus, MockRelay, MockScheduler, MockStore};
    use crate::processors::CommandContext;

    fn player(id: UserId, communication_type: CommunicationType) -> NewPlayerPayload {
        NewPlayerPayload {
            id,
            time: crate::domain::ClockDuration::from_secs_f64(60.0),
            communication_type,
        }
    }

    #[tokio::test]
    async fn creates_a_fresh_game_and_publishes() {
        let mut store = MockStore::default();
        let bus = MockBus::default();
        let scheduler = MockScheduler::default();
        let relay = MockRelay::default();
        let ctx = CommandContext {
            scheduler: &scheduler,
            bus: &bus,
            relay: &relay,
        };

        let p1 = UserId::new();
        let p2 = UserId::new();
        let cmd = CreateGame {
            game_id: GameId::new(),
            lobby_id: LobbyId::new(),
            first_player: player(p1, CommunicationType::Relay),
            second_player: player(p2, CommunicationType::Other),
            created_at: Utc::now(),
            operation_id: Uuid::new_v4(),
        };

        super::create_game(&mut store, &ctx, cmd).await.unwrap();

        assert_eq!(store.saved.len(), 1);
        assert!(store.committed);
        assert_eq!(bus.published.lock().unwrap().len(), 1);
        // At least one player uses Relay, so the lobby channel gets a publication.
        assert_eq!(relay.published.lock().unwrap().len(), 1);
        assert_eq!(store.saved[0].player(p1).unwrap().chip_type, ChipType::First);
    }

    #[tokio::test]
    async fn rejects_a_duplicate_game_id() {
        let p1 = UserId::new();
        let p2 = UserId::new();
        let game_id = GameId::new();
        let existing = crate::domain::rules::create(
            game_id,
            crate::domain::rules::NewPlayer {
                id: p1,
                time_left: crate::domain::ClockDuration::from_secs_f64(60.0),
                communication_type: CommunicationType::Other,
            },
            crate::domain::rules::NewPlayer {
                id: p2,
                time_left: crate::domain::ClockDuration::from_secs_f64(60.0),
                communication_type: CommunicationType::Other,
            },
            Utc::now(),
            None,
        );
        let mut store = MockStore {
            games: vec![existing],
            ..Default::default()
        };
        let bus = MockBus::default();
        let scheduler = MockScheduler::default();
        let relay = MockRelay::default();
        let ctx = CommandContext {
            scheduler: &scheduler,
            bus: &bus,
            relay: &relay,
        };

        let cmd = CreateGame {
            game_id,
            lobby_id: LobbyId::new(),
            first_player: player(p1, CommunicationType::Other),
            second_player: player(p2, CommunicationType::Other),
            created_at: Utc::now(),
            operation_id: Uuid::new_v4(),
        };

        let err = super::create_game(&mut store, &ctx, cmd).await.unwrap_err();
        assert!(matches!(err, crate::error::ApplicationError::GameAlreadyExists(id) if id == game_id));
        assert!(!store.committed);
    }

    #[tokio::test]
    async fn inherits_the_color_swap_from_the_most_recent_game_between_the_pair() {
        let p1 = UserId::new();
        let p2 = UserId::new();
        let last_game = crate::domain::rules::create(
            GameId::new(),
            crate::domain::rules::NewPlayer {
                id: p1,
                time_left: crate::domain::ClockDuration::from_secs_f64(60.0),
                communication_type: CommunicationType::Other,
            },
            crate::domain::rules::NewPlayer {
                id: p2,
                time_left: crate::domain::ClockDuration::from_secs_f64(60.0),
                communication_type: CommunicationType::Other,
            },
            Utc::now(),
            None,
        );
        let mut store = MockStore {
            games: vec![last_game],
            ..Default::default()
        };
        let bus = MockBus::default();
        let scheduler = MockScheduler::default();
        let relay = MockRelay::default();
        let ctx = CommandContext {
            scheduler: &scheduler,
            bus: &bus,
            relay: &relay,
        };

        let cmd = CreateGame {
            game_id: GameId::new(),
            lobby_id: LobbyId::new(),
            first_player: player(p1, CommunicationType::Other),
            second_player: player(p2, CommunicationType::Other),
            created_at: Utc::now(),
            operation_id: Uuid::new_v4(),
        };

        super::create_game(&mut store, &ctx, cmd).await.unwrap();
        let rematch = &store.saved[0];
        assert_eq!(rematch.player(p1).unwrap().chip_type, ChipType::Second);
        assert_eq!(rematch.player(p2).unwrap().chip_type, ChipType::First);
    }
}
