//! TaskRunner (component C8, spec §4.8): dequeues scheduler-fired tasks
//! and submits them as `TryToLoseByTime` commands.

use crate::error::ApplicationError;
use crate::processors::{self, CommandContext};
use crate::scheduler::{FiredTask, TaskScheduler};
use crate::store::GameStore;

/// Bounded retry for application errors other than `GameDoesNotExist`
/// (spec §4.8: "rely on the scheduler backend's limited retry, bounded,
/// e.g. 5").
const MAX_ATTEMPTS: u32 = 5;

pub struct TaskRunner<'a> {
    pub scheduler: &'a dyn TaskScheduler,
    pub context: CommandContext<'a>,
}

impl<'a> TaskRunner<'a> {
    /// Drains up to `batch` fired tasks and processes each one,
    /// constructing a fresh store transaction per task via `new_store`
    /// (a store instance is scoped to a single command, spec §4.3).
    pub async fn run_batch<F>(&self, new_store: F, batch: usize) -> usize
    where
        F: Fn() -> Box<dyn GameStore>,
    {
        let fired = match self.scheduler.drain_fired(batch).await {
            Ok(fired) => fired,
            Err(e) => {
                log::error!("task_runner: could not drain fired tasks: {e}");
                return 0;
            }
        };

        let mut processed = 0;
        for task in fired {
            self.process_one(task, &new_store).await;
            processed += 1;
        }
        processed
    }

    async fn process_one<F>(&self, task: FiredTask, new_store: &F)
    where
        F: Fn() -> Box<dyn GameStore>,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut store = new_store();
            match processors::try_to_lose_by_time(&mut *store, &self.context, task.clone()).await {
                Ok(()) => return,
                Err(ApplicationError::GameDoesNotExist(id)) => {
                    log::warn!("task_runner: game {id} no longer exists, swallowing fired task");
                    return;
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    log::error!(
                        "task_runner: attempt {attempt}/{MAX_ATTEMPTS} for game {} failed: {e}",
                        task.game_id
                    );
                }
                Err(e) => {
                    log::error!(
                        "task_runner: giving up on game {} after {MAX_ATTEMPTS} attempts: {e}",
                        task.game_id
                    );
                }
            }
        }
    }
}
