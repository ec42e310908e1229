//! Environment-sourced configuration (spec §6 "Environment").
//!
//! Mirrors `infrastructure/redis_config.py`, `message_broker/config.py`,
//! and `clients/centrifugo.py`'s `load_centrifugo_config` from the
//! original Python source: plain functions reading env vars with typed
//! defaults, no config-file layer or dedicated config crate.

use std::env;
use std::time::Duration;

const DEFAULT_GAME_EXPIRES_IN_SECS: u64 = 60 * 60;
const DEFAULT_LOCK_EXPIRES_IN_SECS: u64 = 30;
const DEFAULT_LOGGING_LEVEL: &str = "info";

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs_or(key: &str, default_secs: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

pub fn redis_url() -> String {
    env_or("REDIS_URL", "redis://127.0.0.1:6379")
}

pub fn nats_url() -> String {
    env_or("NATS_URL", "nats://127.0.0.1:4222")
}

pub fn centrifugo_url() -> String {
    env_or("CENTRIFUGO_URL", "http://127.0.0.1:8000/api")
}

pub fn centrifugo_api_key() -> String {
    env_or("CENTRIFUGO_API_KEY", "")
}

pub fn game_expires_in() -> Duration {
    env_secs_or("GAME_MAPPER_GAME_EXPIRES_IN", DEFAULT_GAME_EXPIRES_IN_SECS)
}

pub fn lock_expires_in() -> Duration {
    env_secs_or("LOCK_EXPIRES_IN", DEFAULT_LOCK_EXPIRES_IN_SECS)
}

pub fn logging_level() -> String {
    env_or("LOGGING_LEVEL", DEFAULT_LOGGING_LEVEL)
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(logging_level())).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_defaults_when_unset() {
        // SAFETY: test-only removal of a var this process does not otherwise rely on.
        unsafe {
            env::remove_var("LOCK_EXPIRES_IN");
        }
        assert_eq!(lock_expires_in(), Duration::from_secs(DEFAULT_LOCK_EXPIRES_IN_SECS));
    }
}
