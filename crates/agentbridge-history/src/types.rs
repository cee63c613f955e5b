use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangeRecord {
    pub id: i64,
    pub timestamp: f64,
    pub change_type: String,
    pub channel_id: Option<String>,
    pub platform: Option<String>,
    pub data: serde_json::Value,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub message_id: String,
    pub channel_id: String,
    pub platform: String,
    pub sender: String,
    pub content: String,
    pub timestamp: f64,
    pub parent_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecordRow {
    pub id: i64,
    pub action_id: String,
    pub action_type: String,
    pub timestamp: f64,
    pub channel_id: Option<String>,
    pub platform: Option<String>,
    pub parameters: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub success: bool,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: i64,
    pub user_id: String,
    pub platform: String,
    pub memory_type: String,
    pub content: String,
    pub importance: f64,
    pub timestamp: f64,
    pub source_context: Option<String>,
    pub last_accessed: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndecryptableEventRecord {
    pub id: i64,
    pub event_id: String,
    pub room_id: String,
    pub sender: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub error_type: String,
    pub last_retry_ts: f64,
}

/// Document exported for offline training/audit (spec §6 training export).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExport {
    pub state_changes: Vec<StateChangeRecord>,
    pub messages: Vec<MessageRecord>,
    pub actions: Vec<ActionRecordRow>,
}
