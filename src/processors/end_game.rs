//! EndGame processor (spec §4.7 "EndGame processor"). No event is
//! published by this core; the surrounding service that requested the
//! end is expected to produce its own notification.

use crate::domain::rules;
use crate::error::ApplicationError;
use crate::scheduler::task_id;
use crate::store::GameStore;

use super::CommandContext;

pub async fn end_game(
    store: &mut dyn GameStore,
    ctx: &CommandContext<'_>,
    cmd: crate::events::ingress::EndGame,
) -> Result<(), ApplicationError> {
    log::debug!(
        "end_game: entry game_id={} operation_id={}",
        cmd.game_id,
        cmd.operation_id
    );

    let mut game = store
        .by_id(cmd.game_id, true)
        .await?
        .ok_or(ApplicationError::GameDoesNotExist(cmd.game_id))?;

    let old_state_id = game.state_id;
    rules::end_game(&mut game);
    ctx.scheduler.unschedule(&task_id(old_state_id)).await?;
    store.update(game);
    store.commit().await?;

    log::debug!("end_game: exit game_id={}", cmd.game_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::rules::{self, NewPlayer};
    use crate::domain::{ClockDuration, CommunicationType, GameId, GameStatus, UserId};
    use crate::events::ingress::EndGame;
    use crate::processors::test_support::{MockBus, MockRelay, MockScheduler, MockStore};
    use crate::processors::CommandContext;
    use crate::scheduler::task_id;

    #[tokio::test]
    async fn ends_the_game_and_unschedules_the_pending_timeout() {
        let game_id = GameId::new();
        let p1 = UserId::new();
        let p2 = UserId::new();
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
        let old_state_id = game.state_id;
        let mut store = MockStore {
            games: vec![game],
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

        super::end_game(
            &mut store,
            &ctx,
            EndGame {
                game_id,
                operation_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

        assert!(store.committed);
        assert_eq!(store.games[0].status, GameStatus::Ended);
        assert_eq!(
            scheduler.unscheduled.lock().unwrap().as_slice(),
            &[task_id(old_state_id)]
        );
        assert!(bus.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fails_on_a_missing_game() {
        let mut store = MockStore::default();
        let bus = MockBus::default();
        let scheduler = MockScheduler::default();
        let relay = MockRelay::default();
        let ctx = CommandContext {
            scheduler: &scheduler,
            bus: &bus,
            relay: &relay,
        };

        let err = super::end_game(
            &mut store,
            &ctx,
            EndGame {
                game_id: GameId::new(),
                operation_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, crate::error::ApplicationError::GameDoesNotExist(_)));
        assert!(!store.committed);
    }
}
