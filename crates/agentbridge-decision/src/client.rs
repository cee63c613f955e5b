use agentbridge_core::config::LlmConfig;
use agentbridge_core::types::CycleId;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::dump::PayloadDumper;
use crate::error::{DecisionError, Result};
use crate::extract::extract_json;
use crate::types::{ActionPlan, DecisionResult, ToolSpec};

/// Actions beyond this count are dropped, keeping only the top priorities
/// (spec §4.7 action validation & capping).
const MAX_ACTIONS_PER_CYCLE: usize = 3;

/// Client for the external AI decision service (spec §4.7 "C7").
/// Grounded on `skynet-agent::openai::OpenAiProvider` for the HTTP request
/// shape and status-code handling idiom, and on
/// `original_source/chatbot/core/ai_engine.py::make_decision` for the exact
/// 413/402/non-2xx branching this system requires.
pub struct DecisionClient {
    http: Client,
    config: LlmConfig,
    dumper: Option<PayloadDumper>,
}

impl DecisionClient {
    pub fn new(http: Client, config: LlmConfig, dumper: Option<PayloadDumper>) -> Self {
        Self {
            http,
            config,
            dumper,
        }
    }

    /// Makes one decision-service call using `self.config.ai_model`. Used
    /// for the main per-cycle decision as well as any node-summary call the
    /// caller chooses to route through a different model by constructing a
    /// second `DecisionClient` with `config.ai_model = ai_summary_model`.
    pub async fn decide(
        &self,
        system_prompt: &str,
        user_message: &str,
        tools: &[ToolSpec],
        cycle_id: CycleId,
    ) -> Result<DecisionResult> {
        let body = json!({
            "model": self.config.ai_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
            "tools": tools,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let payload_bytes = serde_json::to_vec(&body).unwrap_or_default().len();
        let payload_kb = payload_bytes as f64 / 1024.0;
        info!(cycle_id = %cycle_id, payload_kb, "sending decision request");
        if payload_kb > 512.0 {
            warn!(cycle_id = %cycle_id, payload_kb, "large decision payload");
        }
        if let Some(dumper) = &self.dumper {
            dumper.dump(&cycle_id, &body);
        }

        let resp = self
            .http
            .post(&self.config.ai_endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();

        if status == 413 {
            error!(cycle_id = %cycle_id, payload_kb, "decision request too large (413)");
            return Ok(DecisionResult::empty(
                cycle_id,
                format!("Payload too large ({payload_kb:.2} KB) - reduce configuration settings"),
                "HTTP 413: request payload exceeded server limits",
            ));
        }

        if status == 402 {
            let text = resp.text().await.unwrap_or_default();
            error!(cycle_id = %cycle_id, "decision service quota exhausted (402)");
            return Err(DecisionError::QuotaExceeded { body: text });
        }

        if status < 200 || status >= 300 {
            let text = resp.text().await.unwrap_or_default();
            error!(cycle_id = %cycle_id, status, body = %text, "decision service error");
            return Ok(DecisionResult::empty(
                cycle_id,
                format!("API Error: {status}"),
                format!("HTTP Error: {text}"),
            ));
        }

        let api_response: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(cycle_id = %cycle_id, error = %e, "decision response was not valid JSON");
                return Ok(DecisionResult::empty(
                    cycle_id,
                    "Failed to parse decision service response",
                    "Error in decision service response parsing",
                ));
            }
        };

        let raw_text = api_response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or_default();

        debug!(cycle_id = %cycle_id, preview = %raw_text.chars().take(500).collect::<String>(), "received decision response");

        Ok(parse_decision(raw_text, cycle_id))
    }
}

fn parse_decision(raw_text: &str, cycle_id: CycleId) -> DecisionResult {
    let Some(decision_data) = extract_json(raw_text) else {
        error!(cycle_id = %cycle_id, "failed to extract JSON from decision response");
        return DecisionResult::empty(
            cycle_id,
            "Failed to parse AI response",
            "Error in AI response parsing",
        );
    };

    let observations = decision_data
        .get("observations")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let reasoning = decision_data
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let mut selected_actions: Vec<ActionPlan> = decision_data
        .get("selected_actions")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(ActionPlan::from_value).collect())
        .unwrap_or_default();

    if selected_actions.len() > MAX_ACTIONS_PER_CYCLE {
        warn!(
            cycle_id = %cycle_id,
            selected = selected_actions.len(),
            "decision service selected more than the per-cycle cap, truncating"
        );
        selected_actions.sort_by(|a, b| b.priority.cmp(&a.priority));
        selected_actions.truncate(MAX_ACTIONS_PER_CYCLE);
    }

    for (i, action) in selected_actions.iter().enumerate() {
        info!(cycle_id = %cycle_id, index = i + 1, action_type = %action.action_type, priority = action.priority, "selected action");
    }

    DecisionResult {
        selected_actions,
        reasoning,
        observations,
        cycle_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_decision() {
        let raw = r#"{"observations":"quiet","selected_actions":[{"action_type":"wait","parameters":{},"reasoning":"nothing to do","priority":3}],"reasoning":"ok"}"#;
        let decision = parse_decision(raw, CycleId::new());
        assert_eq!(decision.selected_actions.len(), 1);
        assert_eq!(decision.selected_actions[0].action_type, "wait");
    }

    #[test]
    fn caps_to_max_actions_by_priority() {
        let raw = r#"{"observations":"","reasoning":"","selected_actions":[
            {"action_type":"a","priority":1},
            {"action_type":"b","priority":9},
            {"action_type":"c","priority":5},
            {"action_type":"d","priority":7}
        ]}"#;
        let decision = parse_decision(raw, CycleId::new());
        assert_eq!(decision.selected_actions.len(), MAX_ACTIONS_PER_CYCLE);
        assert_eq!(decision.selected_actions[0].action_type, "b");
    }

    #[test]
    fn falls_back_to_empty_decision_on_garbage() {
        let decision = parse_decision("not json at all", CycleId::new());
        assert!(decision.selected_actions.is_empty());
        assert_eq!(decision.reasoning, "Failed to parse AI response");
    }
}
