use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::{channel::Integration, error::ChannelError, types::ChannelStatus};

const BACKOFF_BASE_SECS: u64 = 5;
const BACKOFF_MAX_SECS: u64 = 300;
const MAX_ATTEMPTS: u32 = 10;
const JITTER_FRACTION: f64 = 0.10;

/// Manages the registered platform integrations: connects them, fans their
/// ingestion loops into one shared observation channel, and routes outbound
/// sends back out to the named adapter (spec §4 / §5).
pub struct IntegrationManager {
    channels: HashMap<String, Arc<Mutex<Box<dyn Integration>>>>,
}

impl IntegrationManager {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    pub fn register(&mut self, integration: Box<dyn Integration>) {
        let name = integration.name().to_string();
        info!(channel = %name, "registering integration adapter");
        self.channels.insert(name, Arc::new(Mutex::new(integration)));
    }

    pub async fn connect_all(&self) {
        for (name, channel) in self.channels.iter() {
            info!(channel = %name, "connecting integration");
            let mut guard = channel.lock().await;
            if let Err(e) = connect_with_backoff(name, guard.as_mut()).await {
                error!(channel = %name, error = %e, "failed to connect integration after retries");
            }
        }
    }

    pub async fn disconnect_all(&self) {
        for (name, channel) in self.channels.iter() {
            info!(channel = %name, "disconnecting integration");
            let mut guard = channel.lock().await;
            if let Err(e) = guard.disconnect().await {
                warn!(channel = %name, error = %e, "error while disconnecting integration");
            }
        }
    }

    /// Spawns one ingestion task per registered integration, each feeding
    /// a shared unbounded channel. The returned receiver is consumed by a
    /// single ingest task that applies world-state mutations (spec §5).
    pub fn spawn_ingestion(&self) -> mpsc::UnboundedReceiver<crate::types::Observation> {
        let (tx, rx) = mpsc::unbounded_channel();
        for (name, channel) in self.channels.iter() {
            let name = name.clone();
            let channel = channel.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut guard = channel.lock().await;
                if let Err(e) = guard.run(tx).await {
                    error!(channel = %name, error = %e, "integration ingestion loop exited");
                }
            });
        }
        rx
    }

    pub fn get(&self, name: &str) -> Option<Arc<Mutex<Box<dyn Integration>>>> {
        self.channels.get(name).cloned()
    }

    pub async fn statuses(&self) -> Vec<(String, ChannelStatus)> {
        let mut result = Vec::new();
        for (name, channel) in self.channels.iter() {
            let guard = channel.lock().await;
            result.push((name.clone(), guard.status()));
        }
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl Default for IntegrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Schedule: 5s -> 10s -> 20s -> ... -> 300s (cap), up to MAX_ATTEMPTS tries,
/// with +/-10% jitter (spec §7 IntegrationTransientError: retry w/ backoff).
async fn connect_with_backoff(name: &str, channel: &mut dyn Integration) -> Result<(), ChannelError> {
    let mut delay_secs = BACKOFF_BASE_SECS;

    for attempt in 1..=MAX_ATTEMPTS {
        match channel.connect().await {
            Ok(()) => {
                info!(channel = %name, attempt, "integration connected successfully");
                return Ok(());
            }
            Err(e) if attempt == MAX_ATTEMPTS => {
                return Err(e);
            }
            Err(e) => {
                let jitter = jitter_secs(delay_secs);
                let total = delay_secs + jitter;
                warn!(
                    channel = %name,
                    attempt,
                    max = MAX_ATTEMPTS,
                    error = %e,
                    retry_after_secs = total,
                    "integration connect failed, retrying with backoff"
                );
                sleep(Duration::from_secs(total)).await;
                delay_secs = (delay_secs * 2).min(BACKOFF_MAX_SECS);
            }
        }
    }

    unreachable!("backoff loop exited without returning")
}

fn jitter_secs(base_secs: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let max_jitter = ((base_secs as f64) * JITTER_FRACTION) as u64;
    if max_jitter == 0 {
        return 0;
    }
    (nanos as u64) % max_jitter
}
