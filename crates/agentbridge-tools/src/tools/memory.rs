use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

/// Stores a durable memory about a user, retrievable by the payload builder
/// on later cycles (spec §4.2/§4.6 memory group).
pub struct StoreMemoryTool;

#[async_trait]
impl Tool for StoreMemoryTool {
    fn name(&self) -> &str {
        "store_memory"
    }

    fn description(&self) -> &str {
        "Store a durable memory about a user for recall in future cycles."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string" },
                "platform": { "type": "string", "enum": ["federated_chat", "social_network"] },
                "memory_type": { "type": "string", "description": "e.g. 'preference', 'fact', 'relationship'." },
                "content": { "type": "string" },
                "importance": { "type": "number", "default": 0.5 }
            },
            "required": ["user_id", "platform", "memory_type", "content"]
        })
    }

    fn group(&self) -> &str {
        "memory"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(user_id), Some(platform), Some(memory_type), Some(content)) = (
            params.get("user_id").and_then(|v| v.as_str()),
            params.get("platform").and_then(|v| v.as_str()),
            params.get("memory_type").and_then(|v| v.as_str()),
            params.get("content").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required memory fields");
        };
        let importance = params.get("importance").and_then(|v| v.as_f64()).unwrap_or(0.5);

        match ctx.history.store_memory(
            user_id,
            platform,
            memory_type,
            content,
            importance,
            None,
            agentbridge_core::types::now_secs(),
        ) {
            Ok(_) => ToolResult::success(format!("Stored memory about {user_id}")),
            Err(e) => ToolResult::error(format!("failed to store memory: {e}")),
        }
    }
}
