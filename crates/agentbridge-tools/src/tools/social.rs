use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_channels::types::{MessageFormat, OutboundMessage};

const MEDIA_REUSE_WINDOW_SECS: f64 = 300.0;

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

fn media_urls_for(params: &Value, ctx: &ActionContext) -> Vec<String> {
    if let Some(url) = params.get("media_url").and_then(|v| v.as_str()) {
        return vec![url.to_string()];
    }
    // Coordination with a prior generate_image call in this cycle (spec
    // §4.6: "generate_image -> post" injects media_id/media_url unless
    // the caller specified one explicitly).
    ctx.world
        .get_last_generated_media(MEDIA_REUSE_WINDOW_SECS)
        .map(|m| vec![m.url])
        .unwrap_or_default()
}

/// Posts a new cast to the social network. Grounded on
/// `original_source/chatbot/tools/executor.py`'s `_send_farcaster_post`.
pub struct SendSocialPostTool;

#[async_trait]
impl Tool for SendSocialPostTool {
    fn name(&self) -> &str {
        "send_social_post"
    }

    fn description(&self) -> &str {
        "Post a new top-level cast to the social network, optionally into a named channel."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel_id": { "type": "string", "description": "Optional social-network channel to post into." },
                "content": { "type": "string" },
                "media_url": { "type": "string", "description": "Optional explicit media URL; otherwise the most recently generated image (if any) is attached." }
            },
            "required": ["content"]
        })
    }

    fn group(&self) -> &str {
        "social-posting"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(content) = params.get("content").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'content'");
        };
        let channel_id = params
            .get("channel_id")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let media_urls = media_urls_for(&params, ctx);

        let Some(integration) = ctx.integrations.get("farcaster") else {
            return ToolResult::error("farcaster integration is not registered");
        };
        let msg = OutboundMessage {
            channel_id,
            content: content.to_string(),
            reply_to: None,
            media_urls,
            format: MessageFormat::PlainText,
        };
        let guard = integration.lock().await;
        match guard.send_message(&msg).await {
            Ok(hash) => ToolResult::success_with_data(
                "Posted to social network",
                json!({ "cast_hash": hash, "content": content }),
            ),
            Err(e) => ToolResult::error(format!("post failed: {e}")),
        }
    }
}

/// Replies to an existing cast. Grounded on
/// `original_source/chatbot/tools/executor.py`'s `_send_farcaster_reply`.
pub struct ReplySocialPostTool;

#[async_trait]
impl Tool for ReplySocialPostTool {
    fn name(&self) -> &str {
        "reply_social_post"
    }

    fn description(&self) -> &str {
        "Reply to an existing cast on the social network."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reply_to": { "type": "string", "description": "Hash of the cast being replied to." },
                "content": { "type": "string" },
                "media_url": { "type": "string" }
            },
            "required": ["reply_to", "content"]
        })
    }

    fn group(&self) -> &str {
        "social-posting"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(reply_to), Some(content)) = (
            params.get("reply_to").and_then(|v| v.as_str()),
            params.get("content").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required 'reply_to' or 'content'");
        };
        let media_urls = media_urls_for(&params, ctx);

        let Some(integration) = ctx.integrations.get("farcaster") else {
            return ToolResult::error("farcaster integration is not registered");
        };
        let msg = OutboundMessage {
            channel_id: String::new(),
            content: content.to_string(),
            reply_to: Some(reply_to.to_string()),
            media_urls,
            format: MessageFormat::PlainText,
        };
        let guard = integration.lock().await;
        match guard.reply_to_message(&msg).await {
            Ok(hash) => ToolResult::success_with_data(
                format!("Replied to {reply_to}"),
                json!({ "cast_hash": hash, "content": content }),
            ),
            Err(e) => ToolResult::error(format!("reply failed: {e}")),
        }
    }
}

/// Reacts to a message or cast (like/dislike/emoji annotation).
pub struct ReactTool;

#[async_trait]
impl Tool for ReactTool {
    fn name(&self) -> &str {
        "react"
    }

    fn description(&self) -> &str {
        "React to a message or cast with an emoji."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": { "type": "string", "enum": ["federated_chat", "social_network"] },
                "message_id": { "type": "string" },
                "emoji": { "type": "string" }
            },
            "required": ["platform", "message_id", "emoji"]
        })
    }

    fn group(&self) -> &str {
        "social-posting"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(platform), Some(message_id), Some(emoji)) = (
            params.get("platform").and_then(|v| v.as_str()),
            params.get("message_id").and_then(|v| v.as_str()),
            params.get("emoji").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required 'platform', 'message_id', or 'emoji'");
        };
        let integration_name = match platform {
            "federated_chat" => "matrix",
            "social_network" => "farcaster",
            other => return ToolResult::error(format!("unknown platform '{other}'")),
        };
        let Some(integration) = ctx.integrations.get(integration_name) else {
            return ToolResult::error(format!("{integration_name} integration is not registered"));
        };
        let guard = integration.lock().await;
        match guard.react(message_id, emoji).await {
            Ok(()) => ToolResult::success(format!("Reacted to {message_id} with {emoji}")),
            Err(e) => ToolResult::error(format!("react failed: {e}")),
        }
    }
}
