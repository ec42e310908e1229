//! Centrifugo-style realtime relay client (spec §4.6, §11 "Centrifugo
//! publication shape"). Grounded on
//! `original_source/connect_four/infrastructure/clients/centrifugo.py`:
//! HTTP POST of `{channel, data}` to `urljoin(base_url, "publish")` with
//! an `X-API-Key` header, and the exact retry envelope
//! (`_MAX_RETRIES=20`, `_BASE_BACKOFF_DELAY=0.5`, `_MAX_BACKOFF_DELAY=10`).

use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;

use super::{RealtimeRelay, RelayError};

const MAX_RETRIES: u32 = 20;
const BASE_BACKOFF_DELAY: Duration = Duration::from_millis(500);
const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(10);

pub struct CentrifugoRelay {
    client: reqwest::Client,
    publish_url: String,
    api_key: String,
}

impl CentrifugoRelay {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            publish_url: join_publish_url(&base_url.into()),
            api_key: api_key.into(),
        }
    }

    async fn try_once(&self, channel: &str, payload: &serde_json::Value) -> Result<(), reqwest::Error> {
        let body = serde_json::json!({ "channel": channel, "data": payload });
        self.client
            .post(&self.publish_url)
            .header("X-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Mirrors Python's `urllib.parse.urljoin(base_url, "publish")`: a base
/// URL ending in `/` gets `publish` appended as a sibling path segment;
/// one without a trailing slash has its last segment replaced.
fn join_publish_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        format!("{base_url}publish")
    } else {
        match base_url.rfind('/') {
            Some(idx) if idx > base_url.find("://").map(|i| i + 2).unwrap_or(0) => {
                format!("{}/publish", &base_url[..idx])
            }
            _ => format!("{base_url}/publish"),
        }
    }
}

#[async_trait]
impl RealtimeRelay for CentrifugoRelay {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), RelayError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: BASE_BACKOFF_DELAY,
            max_interval: MAX_BACKOFF_DELAY,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_err = None;
        for attempt in 1..=MAX_RETRIES {
            match self.try_once(channel, &payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_err = Some(e);
                    if attempt == MAX_RETRIES {
                        break;
                    }
                    let delay = backoff.next_backoff().unwrap_or(MAX_BACKOFF_DELAY);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(RelayError::Exhausted(
            last_err.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}
