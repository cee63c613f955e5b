use agentbridge_core::types::CycleId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single action the decision service proposed or selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action_type: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default = "default_reasoning")]
    pub reasoning: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_reasoning() -> String {
    "No reasoning provided".to_string()
}

fn default_priority() -> u8 {
    5
}

impl ActionPlan {
    /// Builds an `ActionPlan` from a raw decoded action object, filling in
    /// safe defaults for any missing field and normalizing an unknown or
    /// missing `action_type` to `"unknown"` rather than dropping the action
    /// (spec §4.7 action validation & capping).
    pub fn from_value(value: &Value) -> Self {
        let action_type = value
            .get("action_type")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let parameters = value
            .get("parameters")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let reasoning = value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(default_reasoning);
        let priority = value
            .get("priority")
            .and_then(|v| v.as_u64())
            .map(|p| p.clamp(1, 10) as u8)
            .unwrap_or_else(default_priority);
        Self {
            action_type,
            parameters,
            reasoning,
            priority,
        }
    }
}

/// Result of a single decision-service call (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    pub selected_actions: Vec<ActionPlan>,
    pub reasoning: String,
    pub observations: String,
    pub cycle_id: CycleId,
}

impl DecisionResult {
    /// An empty decision carrying a diagnostic reasoning string, used for
    /// every non-fatal failure path (malformed JSON, non-2xx response,
    /// 413 payload-too-large) so a cycle never crashes (spec §4.7/§8).
    pub fn empty(cycle_id: CycleId, reasoning: impl Into<String>, observations: impl Into<String>) -> Self {
        Self {
            selected_actions: Vec::new(),
            reasoning: reasoning.into(),
            observations: observations.into(),
            cycle_id,
        }
    }
}

/// A tool definition passed through to the decision service's `tools` field,
/// mirroring `skynet-agent::provider::ChatRequest`'s tool shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}
