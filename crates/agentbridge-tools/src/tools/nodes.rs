use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

/// Expands a node for detailed inclusion in the next node-based payload
/// (spec §4.3 / §4.8 two-phase exploration).
pub struct ExpandNodeTool;

#[async_trait]
impl Tool for ExpandNodeTool {
    fn name(&self) -> &str {
        "expand_node"
    }

    fn description(&self) -> &str {
        "Expand a collapsed node so its detail appears in the next payload."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "node_path": { "type": "string" } },
            "required": ["node_path"]
        })
    }

    fn group(&self) -> &str {
        "node-control"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(node_path) = params.get("node_path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'node_path'");
        };
        ctx.nodes.expand(node_path);
        ToolResult::success(format!("Expanded {node_path}"))
    }
}

pub struct CollapseNodeTool;

#[async_trait]
impl Tool for CollapseNodeTool {
    fn name(&self) -> &str {
        "collapse_node"
    }

    fn description(&self) -> &str {
        "Collapse a node back to its summary form."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "node_path": { "type": "string" } },
            "required": ["node_path"]
        })
    }

    fn group(&self) -> &str {
        "node-control"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(node_path) = params.get("node_path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'node_path'");
        };
        ctx.nodes.collapse(node_path);
        ToolResult::success(format!("Collapsed {node_path}"))
    }
}

pub struct PinNodeTool;

#[async_trait]
impl Tool for PinNodeTool {
    fn name(&self) -> &str {
        "pin_node"
    }

    fn description(&self) -> &str {
        "Pin a node so it is never auto-collapsed to make room for others."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "node_path": { "type": "string" } },
            "required": ["node_path"]
        })
    }

    fn group(&self) -> &str {
        "node-control"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(node_path) = params.get("node_path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'node_path'");
        };
        ctx.nodes.pin(node_path);
        ToolResult::success(format!("Pinned {node_path}"))
    }
}

pub struct UnpinNodeTool;

#[async_trait]
impl Tool for UnpinNodeTool {
    fn name(&self) -> &str {
        "unpin_node"
    }

    fn description(&self) -> &str {
        "Unpin a node, making it eligible for auto-collapse again."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "node_path": { "type": "string" } },
            "required": ["node_path"]
        })
    }

    fn group(&self) -> &str {
        "node-control"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(node_path) = params.get("node_path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'node_path'");
        };
        ctx.nodes.unpin(node_path);
        ToolResult::success(format!("Unpinned {node_path}"))
    }
}

/// Marks a node's summary stale so the next payload build re-summarizes it,
/// grounded on `json_observer_orchestrator.py`'s `refresh_summary` node tool.
pub struct RefreshSummaryTool;

#[async_trait]
impl Tool for RefreshSummaryTool {
    fn name(&self) -> &str {
        "refresh_summary"
    }

    fn description(&self) -> &str {
        "Force a node's cached summary to be regenerated on the next payload build."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "node_path": { "type": "string" } },
            "required": ["node_path"]
        })
    }

    fn group(&self) -> &str {
        "node-control"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(node_path) = params.get("node_path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'node_path'");
        };
        ctx.nodes.refresh_summary(node_path);
        ToolResult::success(format!("Queued summary refresh for {node_path}"))
    }
}

/// Reports which nodes are expanded/pinned and remaining capacity, grounded
/// on `json_observer_orchestrator.py`'s `get_expansion_status` node tool.
pub struct GetExpansionStatusTool;

#[async_trait]
impl Tool for GetExpansionStatusTool {
    fn name(&self) -> &str {
        "get_expansion_status"
    }

    fn description(&self) -> &str {
        "Report which nodes are currently expanded or pinned, and remaining expansion capacity."
    }

    fn parameter_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn group(&self) -> &str {
        "node-control"
    }

    async fn execute(&self, _params: Value, ctx: &ActionContext) -> ToolResult {
        let status = ctx.nodes.get_expansion_status();
        let data = serde_json::to_value(&status).unwrap_or_default();
        ToolResult::success_with_data(
            format!(
                "{} expanded, {} pinned, capacity {}",
                status.expanded.len(),
                status.pinned.len(),
                status.capacity
            ),
            data,
        )
    }
}
