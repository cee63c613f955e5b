use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub node_path: String,
    pub is_expanded: bool,
    pub is_pinned: bool,
    pub last_expanded_ts: f64,
    pub last_summary_ts: f64,
    pub last_data_fingerprint: Option<u64>,
    pub ai_summary: String,
}

impl NodeMetadata {
    pub fn new(node_path: impl Into<String>) -> Self {
        Self {
            node_path: node_path.into(),
            is_expanded: false,
            is_pinned: false,
            last_expanded_ts: 0.0,
            last_summary_ts: 0.0,
            last_data_fingerprint: None,
            ai_summary: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionStatus {
    pub expanded: Vec<String>,
    pub pinned: Vec<String>,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvent {
    pub timestamp: f64,
    pub kind: String,
    pub node_path: String,
    pub detail: String,
}
