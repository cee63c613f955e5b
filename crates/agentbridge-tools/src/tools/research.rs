use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

/// Searches the social network for casts matching a query (spec §4.6
/// research/search group).
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the social network for posts matching a query."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        })
    }

    fn group(&self) -> &str {
        "research"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(query) = params.get("query").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'query'");
        };
        let Some(integration) = ctx.integrations.get("farcaster") else {
            return ToolResult::error("farcaster integration is not registered");
        };
        let guard = integration.lock().await;
        match guard.search(query).await {
            Ok(results) => ToolResult::success_with_data(
                format!("Found {} result(s) for '{query}'", results.len()),
                json!({ "results": results }),
            ),
            Err(e) => ToolResult::error(format!("search failed: {e}")),
        }
    }
}
