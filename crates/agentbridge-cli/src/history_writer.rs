//! Write-behind task for durable history (spec §5: "C2 is accessed only
//! through its own serialized writer task"). The ingest consumer enqueues
//! records here instead of calling `HistoryRecorder` inline on the hot
//! ingest path; a single task drains the queue and warns on back-pressure.
//!
//! No source file in the retrieval pack implements this exact queue —
//! built from spec §5's explicit "write-behind task... back-pressure
//! triggers a log warning" requirement, shaped like the ingest channel's
//! own `tokio::sync::mpsc` consumer loop ([[agentbridge-channels]]).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agentbridge_history::HistoryRecorder;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

const BACKLOG_WARN_THRESHOLD: usize = 100;

pub enum HistoryJob {
    Message {
        message_id: String,
        channel_id: String,
        platform: String,
        sender_id: String,
        content: String,
        timestamp: f64,
        reply_to: Option<String>,
        raw_payload: Option<serde_json::Value>,
    },
    StateChange {
        change_type: String,
        data: serde_json::Value,
        channel_id: Option<String>,
        platform: Option<String>,
        timestamp: f64,
    },
}

#[derive(Clone)]
pub struct HistoryWriter {
    tx: UnboundedSender<HistoryJob>,
    backlog: Arc<AtomicUsize>,
}

impl HistoryWriter {
    /// Enqueues a job. Never blocks; a full/closed writer task only logs.
    pub fn submit(&self, job: HistoryJob) {
        let depth = self.backlog.fetch_add(1, Ordering::Relaxed) + 1;
        if depth == BACKLOG_WARN_THRESHOLD {
            warn!(depth, "history write-behind queue backing up");
        }
        if self.tx.send(job).is_err() {
            warn!("history writer task has exited, dropping record");
        }
    }
}

pub fn spawn(history: Arc<HistoryRecorder>) -> HistoryWriter {
    let (tx, rx) = mpsc::unbounded_channel();
    let backlog = Arc::new(AtomicUsize::new(0));
    tokio::spawn(run(history, rx, backlog.clone()));
    HistoryWriter { tx, backlog }
}

async fn run(history: Arc<HistoryRecorder>, mut rx: UnboundedReceiver<HistoryJob>, backlog: Arc<AtomicUsize>) {
    while let Some(job) = rx.recv().await {
        backlog.fetch_sub(1, Ordering::Relaxed);
        let result = match job {
            HistoryJob::Message {
                message_id,
                channel_id,
                platform,
                sender_id,
                content,
                timestamp,
                reply_to,
                raw_payload,
            } => history.record_message(
                &message_id,
                &channel_id,
                &platform,
                &sender_id,
                &content,
                timestamp,
                reply_to.as_deref(),
                raw_payload.as_ref(),
            ),
            HistoryJob::StateChange {
                change_type,
                data,
                channel_id,
                platform,
                timestamp,
            } => history.record_state_change(&change_type, &data, channel_id.as_deref(), platform.as_deref(), None, timestamp),
        };
        if let Err(e) = result {
            warn!(error = %e, "history write-behind record failed");
        }
    }
    tracing::info!("history writer channel closed, task exiting");
}
