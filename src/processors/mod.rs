//! CommandProcessors (component C7, spec §4.7): one per command kind,
//! orchestrating C2-C6 with exactly one `store.commit()` at the end.

mod create_game;
mod end_game;
mod make_move;
mod try_to_lose_by_time;

pub use create_game::create_game;
pub use end_game::end_game;
pub use make_move::make_move;
pub use try_to_lose_by_time::try_to_lose_by_time;

use crate::bus::EventBus;
use crate::domain::Game;
use crate::events::RelayPlayerView;
use crate::relay::RealtimeRelay;
use crate::scheduler::TaskScheduler;

/// Request-scoped handles a processor needs beyond the store (spec §9
/// "Dependency container vs. explicit wiring": explicit construction at
/// the worker-boot boundary, per-request structs holding request-scoped
/// handles, rather than a runtime DI container).
pub struct CommandContext<'a> {
    pub scheduler: &'a dyn TaskScheduler,
    pub bus: &'a dyn EventBus,
    pub relay: &'a dyn RealtimeRelay,
}

/// Relay publication is gated on at least one player using it (spec §4.6).
pub(crate) fn any_player_uses_relay(game: &Game) -> bool {
    game.players
        .values()
        .any(|p| p.communication_type == crate::domain::CommunicationType::Relay)
}

/// The `{player_id.hex: {chip_type, time_left}}` map embedded in every
/// relay payload (`centrifugo.py`'s `players = {...}` comprehension).
pub(crate) fn relay_players(game: &Game) -> std::collections::HashMap<String, RelayPlayerView> {
    game.players
        .iter()
        .map(|(id, state)| {
            (
                id.hex(),
                RelayPlayerView {
                    chip_type: state.chip_type,
                    time_left: state.time_left,
                },
            )
        })
        .collect()
}

/// In-memory fakes for `GameStore`/`EventBus`/`TaskScheduler`/`RealtimeRelay`,
/// shared by every processor's test module. Kept here rather than behind a
/// `dev-dependencies` mocking crate since the trait surface is small and the
/// teacher's own tests (e.g. `storage.rs`) favor hand-rolled fakes over a
/// mocking framework.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::bus::{BusError, EventBus};
    use crate::domain::{Game, GameId, UserId};
    use crate::events::Event;
    use crate::relay::{RealtimeRelay, RelayError};
    use crate::scheduler::{FiredTask, SchedulerError, Task, TaskScheduler};
    use crate::store::{GameStore, SortBy, StoreError};

    #[derive(Default)]
    pub(crate) struct MockStore {
        pub games: Vec<Game>,
        pub saved: Vec<Game>,
        pub updated: Vec<Game>,
        pub committed: bool,
    }

    #[async_trait]
    impl GameStore for MockStore {
        async fn by_id(&mut self, id: GameId, _acquire_lock: bool) -> Result<Option<Game>, StoreError> {
            Ok(self.games.iter().find(|g| g.id == id).cloned())
        }

        async fn list_by_player_ids(
            &mut self,
            pair: [UserId; 2],
            sort_by: Option<SortBy>,
            limit: usize,
        ) -> Result<Vec<Game>, StoreError> {
            let mut matches: Vec<Game> = self
                .games
                .iter()
                .filter(|g| g.player_pair_sorted() == pair)
                .cloned()
                .collect();
            if sort_by == Some(SortBy::DescCreatedAt) {
                matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            if limit > 0 {
                matches.truncate(limit);
            }
            Ok(matches)
        }

        fn save(&mut self, game: Game) {
            self.games.push(game.clone());
            self.saved.push(game);
        }

        fn update(&mut self, game: Game) {
            if let Some(slot) = self.games.iter_mut().find(|g| g.id == game.id) {
                *slot = game.clone();
            }
            self.updated.push(game);
        }

        async fn commit(&mut self) -> Result<(), StoreError> {
            self.committed = true;
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockBus {
        pub published: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl EventBus for MockBus {
        async fn publish(&self, event: &Event) -> Result<(), BusError> {
            self.published.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockScheduler {
        pub scheduled: Mutex<Vec<Task>>,
        pub unscheduled: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskScheduler for MockScheduler {
        async fn schedule(&self, task: Task) -> Result<(), SchedulerError> {
            self.scheduled.lock().unwrap().push(task);
            Ok(())
        }

        async fn unschedule(&self, task_id: &str) -> Result<(), SchedulerError> {
            self.unscheduled.lock().unwrap().push(task_id.to_string());
            Ok(())
        }

        async fn promote_due(&self, _now: chrono::DateTime<chrono::Utc>) -> Result<usize, SchedulerError> {
            Ok(0)
        }

        async fn drain_fired(&self, _max: usize) -> Result<Vec<FiredTask>, SchedulerError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockRelay {
        pub published: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait]
    impl RealtimeRelay for MockRelay {
        async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), RelayError> {
            self.published
                .lock()
                .unwrap()
                .push((channel.to_string(), payload));
            Ok(())
        }
    }
}
