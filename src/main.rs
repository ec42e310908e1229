//! # Connect Four game-command engine
//!
//! The authoritative game-logic service for a two-player Connect Four
//! product. A durable message bus routes inbound commands to it; it
//! owns game state, enforces rules and per-player clocks, schedules
//! timed loss-by-time verdicts, and fans out state transitions as
//! domain events and realtime publications.
//!
//! ## Usage
//!
//! ```bash
//! # Admin one-shots
//! connect-four-engine create-game --id ... --lobby-id ... \
//!     --first-player-id ... --first-player-time 00:10:00 --first-player-communication relay \
//!     --second-player-id ... --second-player-time 00:10:00 --second-player-communication relay
//! connect-four-engine end-game --id ...
//!
//! # Long-running workers
//! connect-four-engine create-streams
//! connect-four-engine run-consumer
//! connect-four-engine run-scheduler
//! connect-four-engine run-executor
//! ```

pub mod bus;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod processors;
pub mod relay;
pub mod scheduler;
pub mod store;
pub mod task_runner;

use std::io::Write as _;
use std::time::Duration;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use bb8_redis::RedisConnectionManager;
use bus::NatsEventBus;
use chrono::Utc;
use domain::{CommunicationType, GameId, LobbyId, UserId};
use error::ApplicationError;
use events::ingress::{CreateGame, EndGame, NewPlayerPayload};
use processors::CommandContext;
use relay::CentrifugoRelay;
use scheduler::{RedisTaskScheduler, TaskScheduler};
use store::{GameStore, RedisGameStore};
use task_runner::TaskRunner;

/// Connect Four game-command engine — rules, durable storage, timeouts,
/// event fan-out (spec §6 "CLI (admin one-shots)").
#[derive(Parser, Debug)]
#[command(name = "connect-four-engine")]
#[command(about = "Game-command engine for Connect Four")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Creates a new game between two players.
    CreateGame {
        #[arg(long = "id")]
        id: String,
        #[arg(long)]
        lobby_id: String,
        #[arg(long)]
        first_player_id: String,
        #[arg(long)]
        first_player_time: String,
        #[arg(long)]
        first_player_communication: String,
        #[arg(long)]
        second_player_id: String,
        #[arg(long)]
        second_player_time: String,
        #[arg(long)]
        second_player_communication: String,
    },

    /// Force-ends a game.
    EndGame {
        #[arg(long = "id")]
        id: String,
    },

    /// Idempotently declares the `games` JetStream stream and its full
    /// subject set (spec §11 "NATS stream provisioning").
    CreateStreams,

    /// Runs the durable bus consumer, applying inbound commands.
    RunConsumer,

    /// Runs the task-scheduler poll loop, flipping due tasks to fired.
    RunScheduler,

    /// Runs the TaskRunner (C8), draining fired tasks into commands.
    RunExecutor,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    config::init_logging();

    let cli = Cli::parse();
    let result = dispatch(cli.command).await;

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Commands) -> Result<(), ApplicationError> {
    match command {
        Commands::CreateGame {
            id,
            lobby_id,
            first_player_id,
            first_player_time,
            first_player_communication,
            second_player_id,
            second_player_time,
            second_player_communication,
        } => {
            if !confirm(&format!("Create game {id}?")) {
                return Ok(());
            }
            let cmd = CreateGame {
                game_id: parse_id(&id)?,
                lobby_id: parse_lobby_id(&lobby_id)?,
                first_player: NewPlayerPayload {
                    id: parse_user_id(&first_player_id)?,
                    time: parse_duration(&first_player_time)?,
                    communication_type: parse_communication(&first_player_communication)?,
                },
                second_player: NewPlayerPayload {
                    id: parse_user_id(&second_player_id)?,
                    time: parse_duration(&second_player_time)?,
                    communication_type: parse_communication(&second_player_communication)?,
                },
                created_at: Utc::now(),
                operation_id: Uuid::new_v4(),
            };
            let deps = Dependencies::connect().await?;
            let mut store = deps.new_store();
            processors::create_game(&mut *store, &deps.context(), cmd).await
        }
        Commands::EndGame { id } => {
            if !confirm(&format!("End game {id}?")) {
                return Ok(());
            }
            let cmd = EndGame {
                game_id: parse_id(&id)?,
                operation_id: Uuid::new_v4(),
            };
            let deps = Dependencies::connect().await?;
            let mut store = deps.new_store();
            processors::end_game(&mut *store, &deps.context(), cmd).await
        }
        Commands::CreateStreams => {
            let bus = NatsEventBus::connect(&config::nats_url()).await?;
            bus.ensure_stream().await?;
            log::info!("games stream ensured");
            Ok(())
        }
        Commands::RunConsumer => run_consumer().await,
        Commands::RunScheduler => run_scheduler().await,
        Commands::RunExecutor => run_executor().await,
    }
}

/// Long-lived infrastructure handles shared across one worker process.
/// Each command gets its own `GameStore` transaction (`new_store`);
/// the bus, scheduler, and relay clients are thread-safe and shared
/// (spec §5 "Shared resources").
struct Dependencies {
    bus: NatsEventBus,
    scheduler: RedisTaskScheduler,
    relay: CentrifugoRelay,
    redis_pool: bb8::Pool<RedisConnectionManager>,
}

impl Dependencies {
    async fn connect() -> Result<Self, ApplicationError> {
        let manager = RedisConnectionManager::new(config::redis_url())
            .map_err(|e| ApplicationError::Config(e.to_string()))?;
        let redis_pool = bb8::Pool::builder()
            .build(manager)
            .await
            .map_err(|e| ApplicationError::Config(e.to_string()))?;
        let bus = NatsEventBus::connect(&config::nats_url()).await?;
        let scheduler = RedisTaskScheduler::new(redis_pool.clone());
        let relay = CentrifugoRelay::new(config::centrifugo_url(), config::centrifugo_api_key());
        Ok(Self {
            bus,
            scheduler,
            relay,
            redis_pool,
        })
    }

    fn new_store(&self) -> Box<dyn GameStore> {
        Box::new(RedisGameStore::new(
            self.redis_pool.clone(),
            config::game_expires_in(),
            config::lock_expires_in(),
        ))
    }

    fn context(&self) -> CommandContext<'_> {
        CommandContext {
            scheduler: &self.scheduler,
            bus: &self.bus,
            relay: &self.relay,
        }
    }
}

/// Drains inbound commands from the bus and applies them. The decoder
/// that turns raw bus messages into validated command records is out of
/// scope (spec §1 "Out of scope"); this subcommand is a placeholder that
/// idles until that wiring exists, rather than actually consuming anything.
async fn run_consumer() -> Result<(), ApplicationError> {
    let deps = Dependencies::connect().await?;
    log::warn!(
        "run-consumer: inbound command decoding is not wired up (out of scope); idling instead of consuming"
    );
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = &deps;
    }
}

async fn run_scheduler() -> Result<(), ApplicationError> {
    let deps = Dependencies::connect().await?;
    log::info!("run-scheduler: polling for due try_to_lose_by_time tasks");
    loop {
        match deps.scheduler.promote_due(Utc::now()).await {
            Ok(n) if n > 0 => log::debug!("run-scheduler: promoted {n} due tasks"),
            Ok(_) => {}
            Err(e) => log::error!("run-scheduler: poll failed: {e}"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn run_executor() -> Result<(), ApplicationError> {
    let deps = Dependencies::connect().await?;
    let runner = TaskRunner {
        scheduler: &deps.scheduler,
        context: deps.context(),
    };
    log::info!("run-executor: draining fired try_to_lose_by_time tasks");
    loop {
        let processed = runner.run_batch(|| deps.new_store(), 20).await;
        if processed == 0 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn parse_id(s: &str) -> Result<GameId, ApplicationError> {
    GameId::from_hex(s).map_err(|e| ApplicationError::Config(e.to_string()))
}

fn parse_lobby_id(s: &str) -> Result<LobbyId, ApplicationError> {
    LobbyId::from_hex(s).map_err(|e| ApplicationError::Config(e.to_string()))
}

fn parse_user_id(s: &str) -> Result<UserId, ApplicationError> {
    UserId::from_hex(s).map_err(|e| ApplicationError::Config(e.to_string()))
}

fn parse_duration(s: &str) -> Result<domain::ClockDuration, ApplicationError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| ApplicationError::Config(e.to_string()))
}

fn parse_communication(s: &str) -> Result<CommunicationType, ApplicationError> {
    match s.to_lowercase().as_str() {
        "relay" => Ok(CommunicationType::Relay),
        "other" => Ok(CommunicationType::Other),
        other => Err(ApplicationError::Config(format!(
            "invalid communication type: {other}"
        ))),
    }
}
