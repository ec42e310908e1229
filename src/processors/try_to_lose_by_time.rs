//! TryToLoseByTime processor (spec §4.7 "TryToLoseByTime processor").
//! Submitted by the TaskRunner (C8) for every fired scheduler task.

use crate::domain::rules;
use crate::error::ApplicationError;
use crate::events::{self, Event, GameEndReason, RelayPayload};
use crate::scheduler::FiredTask;
use crate::store::GameStore;

use super::{any_player_uses_relay, relay_players, CommandContext};

pub async fn try_to_lose_by_time(
    store: &mut dyn GameStore,
    ctx: &CommandContext<'_>,
    fired: FiredTask,
) -> Result<(), ApplicationError> {
    log::debug!(
        "try_to_lose_by_time: entry game_id={} operation_id={}",
        fired.game_id,
        fired.operation_id
    );

    let mut game = store
        .by_id(fired.game_id, true)
        .await?
        .ok_or(ApplicationError::GameDoesNotExist(fired.game_id))?;

    let last_turn = game.current_turn;
    let fired_game_state_id = fired.game_state_id;
    let applied = rules::try_to_lose_by_time(&mut game, fired_game_state_id);

    if !applied {
        log::warn!(
            "try_to_lose_by_time: stale task for game_id={} expected_state_id={}",
            fired.game_id,
            fired_game_state_id
        );
        // The lock was acquired by by_id above; it must still be
        // released even though nothing was written (spec §4.3, §5).
        store.commit().await?;
        return Ok(());
    }

    store.update(game.clone());

    ctx.bus
        .publish(&Event::GameEnded {
            game_id: fired.game_id,
            reason: GameEndReason::LossByTime,
            chip_location: None,
            operation_id: fired.operation_id,
        })
        .await?;

    if any_player_uses_relay(&game) {
        let payload = RelayPayload::GameEnded {
            location: None,
            players: relay_players(&game),
            reason: GameEndReason::LossByTime,
            last_turn: last_turn.hex(),
        };
        ctx.relay
            .publish(&events::game_channel(game.id), serde_json::to_value(payload)?)
            .await?;
    }

    store.commit().await?;
    log::debug!("try_to_lose_by_time: exit game_id={}", fired.game_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::rules::{self, NewPlayer};
    use crate::domain::{ClockDuration, CommunicationType, GameId, GameStatus, UserId};
    use crate::processors::test_support::{MockBus, MockRelay, MockScheduler, MockStore};
    use crate::processors::CommandContext;
    use crate::scheduler::FiredTask;

    fn seeded_store(game_id: GameId, p1: UserId, p2: UserId) -> (MockStore, crate::domain::GameStateId) {
        let game = rules::create(
            game_id,
            NewPlayer {
                id: p1,
                time_left: ClockDuration::from_secs_f64(60.0),
                communication_type: CommunicationType::Other,
            },
            NewPlayer {
                id: p2,
                time_left: ClockDuration::from_secs_f64(60.0),
                communication_type: CommunicationType::Other,
            },
            Utc::now(),
            None,
        );
        let state_id = game.state_id;
        (
            MockStore {
                games: vec![game],
                ..Default::default()
            },
            state_id,
        )
    }

    #[tokio::test]
    async fn ends_the_game_when_the_state_id_still_matches() {
        let game_id = GameId::new();
        let p1 = UserId::new();
        let p2 = UserId::new();
        let (mut store, state_id) = seeded_store(game_id, p1, p2);

        let bus = MockBus::default();
        let scheduler = MockScheduler::default();
        let relay = MockRelay::default();
        let ctx = CommandContext {
            scheduler: &scheduler,
            bus: &bus,
            relay: &relay,
        };

        super::try_to_lose_by_time(
            &mut store,
            &ctx,
            FiredTask {
                game_id,
                game_state_id: state_id,
                operation_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

        assert!(store.committed);
        assert_eq!(store.games[0].status, GameStatus::Ended);
        assert_eq!(bus.published.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_firing_is_a_silent_no_op_but_still_commits_to_release_the_lock() {
        let game_id = GameId::new();
        let p1 = UserId::new();
        let p2 = UserId::new();
        let (mut store, _current_state_id) = seeded_store(game_id, p1, p2);
        let stale_state_id = crate::domain::GameStateId::new();

        let bus = MockBus::default();
        let scheduler = MockScheduler::default();
        let relay = MockRelay::default();
        let ctx = CommandContext {
            scheduler: &scheduler,
            bus: &bus,
            relay: &relay,
        };

        super::try_to_lose_by_time(
            &mut store,
            &ctx,
            FiredTask {
                game_id,
                game_state_id: stale_state_id,
                operation_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

        assert!(store.committed);
        assert_eq!(store.games[0].status, GameStatus::NotStarted);
        assert!(bus.published.lock().unwrap().is_empty());
        assert!(store.updated.is_empty());
    }
}
