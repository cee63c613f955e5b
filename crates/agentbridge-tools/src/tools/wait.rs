use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

/// Deliberate no-op: observe without acting (spec §4.6 waits group).
/// Grounded on `original_source/chatbot/tools/executor.py`'s `_wait_action`.
pub struct WaitTool;

#[async_trait]
impl Tool for WaitTool {
    fn name(&self) -> &str {
        "wait"
    }

    fn description(&self) -> &str {
        "Take no action this cycle and simply continue observing."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": { "type": "string", "description": "Why waiting is the right call right now." }
            }
        })
    }

    fn group(&self) -> &str {
        "wait"
    }

    async fn execute(&self, params: Value, _ctx: &ActionContext) -> ToolResult {
        let reason = params
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("no reason given");
        ToolResult::success(format!("Waited and observed ({reason})"))
    }
}
