use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

fn integration_for(platform: &str) -> Option<&'static str> {
    match platform {
        "federated_chat" => Some("matrix"),
        "social_network" => Some("farcaster"),
        _ => None,
    }
}

/// Accepts a pending room invite, joining the room and clearing it from
/// the pending-invite list (spec §3 `PendingInvite` lifecycle).
pub struct AcceptInviteTool;

#[async_trait]
impl Tool for AcceptInviteTool {
    fn name(&self) -> &str {
        "accept_invite"
    }

    fn description(&self) -> &str {
        "Accept a pending invite to join a channel."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": { "type": "string", "enum": ["federated_chat", "social_network"] },
                "channel_id": { "type": "string" }
            },
            "required": ["platform", "channel_id"]
        })
    }

    fn group(&self) -> &str {
        "room-management"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(platform), Some(channel_id)) = (
            params.get("platform").and_then(|v| v.as_str()),
            params.get("channel_id").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required 'platform' or 'channel_id'");
        };
        let Some(name) = integration_for(platform) else {
            return ToolResult::error(format!("unknown platform '{platform}'"));
        };
        let Some(integration) = ctx.integrations.get(name) else {
            return ToolResult::error(format!("{name} integration is not registered"));
        };
        let guard = integration.lock().await;
        match guard.join_room(channel_id).await {
            Ok(()) => {
                ctx.world.remove_pending_invite(channel_id);
                ToolResult::success(format!("Joined {channel_id}"))
            }
            Err(e) => ToolResult::error(format!("join failed: {e}")),
        }
    }
}

/// Leaves a channel the bot is currently a member of.
pub struct LeaveRoomTool;

#[async_trait]
impl Tool for LeaveRoomTool {
    fn name(&self) -> &str {
        "leave_room"
    }

    fn description(&self) -> &str {
        "Leave a channel the bot is currently a member of."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": { "type": "string", "enum": ["federated_chat", "social_network"] },
                "channel_id": { "type": "string" }
            },
            "required": ["platform", "channel_id"]
        })
    }

    fn group(&self) -> &str {
        "room-management"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(platform), Some(channel_id)) = (
            params.get("platform").and_then(|v| v.as_str()),
            params.get("channel_id").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required 'platform' or 'channel_id'");
        };
        let Some(name) = integration_for(platform) else {
            return ToolResult::error(format!("unknown platform '{platform}'"));
        };
        let Some(integration) = ctx.integrations.get(name) else {
            return ToolResult::error(format!("{name} integration is not registered"));
        };
        let guard = integration.lock().await;
        match guard.leave_room(channel_id).await {
            Ok(()) => {
                ctx.world
                    .update_channel_status(channel_id, agentbridge_world::types::ChannelStatus::Left);
                ToolResult::success(format!("Left {channel_id}"))
            }
            Err(e) => ToolResult::error(format!("leave failed: {e}")),
        }
    }
}
