use agentbridge_core::types::now_secs;
use agentbridge_world::types::ActionRecord;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::ActionContext;
use crate::registry::{ToolRegistry, ToolResult};

/// Maximum number of actions dispatched per cycle (spec §4.6/§4.8).
pub const MAX_ACTIONS_PER_CYCLE: usize = 3;

/// A single action the decision service selected, ready for dispatch.
#[derive(Debug, Clone)]
pub struct SelectedAction {
    pub action_type: String,
    pub parameters: Value,
    pub reasoning: String,
    pub priority: u8,
}

/// Outcome of dispatching one `SelectedAction`.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub action_type: String,
    pub success: bool,
    pub result: ToolResult,
}

/// Dispatches a priority-ordered, `MAX_ACTIONS_PER_CYCLE`-capped batch of
/// actions against the tool registry, enforcing C5 before each execution
/// and recording every outcome into C1/C2 (spec §4.6 execution sequence:
/// check rate limit -> look up tool -> execute -> record success incl.
/// injecting the bot's own message into recent_messages -> record channel
/// usage -> set_last_action_result; on failure, record success=false).
pub async fn dispatch_actions(
    actions: &[SelectedAction],
    registry: &ToolRegistry,
    ctx: &ActionContext,
) -> Vec<DispatchOutcome> {
    let mut ordered: Vec<&SelectedAction> = actions.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
    ordered.truncate(MAX_ACTIONS_PER_CYCLE);

    let mut outcomes = Vec::with_capacity(ordered.len());
    for action in ordered {
        outcomes.push(dispatch_one(action, registry, ctx).await);
    }
    outcomes
}

async fn dispatch_one(
    action: &SelectedAction,
    registry: &ToolRegistry,
    ctx: &ActionContext,
) -> DispatchOutcome {
    let now = now_secs();
    let (allowed, reason) = ctx.rate_limiter.can_execute_action(&action.action_type, now);
    if !allowed {
        warn!(action = %action.action_type, reason = %reason, "action blocked by rate limiter");
        let result = ToolResult::error(reason);
        record(action, &result, ctx, now, None);
        return DispatchOutcome {
            action_type: action.action_type.clone(),
            success: false,
            result,
        };
    }

    let Some(tool) = registry.get(&action.action_type) else {
        let result = ToolResult::error(format!("unknown tool '{}'", action.action_type));
        record(action, &result, ctx, now, None);
        return DispatchOutcome {
            action_type: "unknown".to_string(),
            success: false,
            result,
        };
    };

    let start = now_secs();
    let result = tool.execute(action.parameters.clone(), ctx).await;
    let duration_ms = ((now_secs() - start) * 1000.0) as i64;

    ctx.rate_limiter.record_action(&action.action_type, now);
    if let Some(channel_id) = action
        .parameters
        .get("channel_id")
        .and_then(|v| v.as_str())
    {
        if let Some(channel) = ctx.world.get_channel(channel_id) {
            ctx.rate_limiter
                .record_channel_message(channel_id, channel.platform.as_str(), now);
        }
    }

    if !result.is_error {
        info!(action = %action.action_type, "action executed successfully");
        inject_own_message(action, &result, ctx, now);
    } else {
        warn!(action = %action.action_type, error = %result.content, "action execution failed");
    }

    record(action, &result, ctx, now, Some(duration_ms));

    DispatchOutcome {
        action_type: action.action_type.clone(),
        success: !result.is_error,
        result,
    }
}

/// When a message-sending action succeeds, the bot's own message is
/// immediately visible in the next payload's channel context, matching the
/// source's bot-message-visibility property (spec §8).
fn inject_own_message(action: &SelectedAction, result: &ToolResult, ctx: &ActionContext, now: f64) {
    let is_outbound = matches!(
        action.action_type.as_str(),
        "send_chat_message" | "reply_chat_message" | "send_social_post" | "reply_social_post"
    );
    if !is_outbound {
        return;
    }
    let Some(data) = &result.data else { return };
    let channel_id = action
        .parameters
        .get("channel_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let content = data
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if channel_id.is_empty() || content.is_empty() {
        return;
    }
    let platform = if action.action_type.starts_with("send_social")
        || action.action_type.starts_with("reply_social")
    {
        agentbridge_core::types::Platform::SocialNetwork
    } else {
        agentbridge_core::types::Platform::FederatedChat
    };
    let message_id = data
        .get("message_id")
        .or_else(|| data.get("cast_hash"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ctx.world.add_message(agentbridge_world::types::Message {
        id: message_id,
        channel_id: channel_id.to_string(),
        platform,
        sender_id: "self".to_string(),
        sender_display: Some("self".to_string()),
        content: content.to_string(),
        timestamp: now,
        reply_to: action
            .parameters
            .get("reply_to")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        media_urls: Vec::new(),
        metadata: std::collections::HashMap::new(),
    });
}

fn record(
    action: &SelectedAction,
    result: &ToolResult,
    ctx: &ActionContext,
    now: f64,
    duration_ms: Option<i64>,
) {
    let channel_id = action
        .parameters
        .get("channel_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let record = ActionRecord {
        id: Uuid::new_v4().to_string(),
        action_kind: action.action_type.clone(),
        parameters: action.parameters.clone(),
        result: serde_json::json!({ "content": result.content, "data": result.data }),
        success: !result.is_error,
        channel_id: channel_id.clone(),
        platform: None,
        timestamp: now,
        duration_ms: duration_ms.map(|ms| ms.max(0) as u64),
        reasoning: Some(action.reasoning.clone()),
        is_self: true,
    };
    ctx.world.add_action_result(record.clone());
    ctx.world.set_last_action_result(record.clone());

    if let Err(e) = ctx.history.record_action(
        &record.id,
        &action.action_type,
        &action.parameters,
        Some(&serde_json::json!({ "content": result.content })),
        !result.is_error,
        channel_id.as_deref(),
        None,
        duration_ms,
        now,
    ) {
        warn!(error = %e, "failed to persist action record");
    }
}
