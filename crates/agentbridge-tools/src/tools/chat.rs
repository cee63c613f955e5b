use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_channels::types::{MessageFormat, OutboundMessage};

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

/// Sends a new message into a federated-chat channel. Grounded on
/// `original_source/chatbot/tools/executor.py`'s `_send_matrix_message`.
pub struct SendChatMessageTool;

#[async_trait]
impl Tool for SendChatMessageTool {
    fn name(&self) -> &str {
        "send_chat_message"
    }

    fn description(&self) -> &str {
        "Send a new message into a federated-chat channel."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel_id": { "type": "string", "description": "Target room/channel id." },
                "content": { "type": "string", "description": "Message text." }
            },
            "required": ["channel_id", "content"]
        })
    }

    fn group(&self) -> &str {
        "chat-messaging"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(channel_id), Some(content)) = (
            params.get("channel_id").and_then(|v| v.as_str()),
            params.get("content").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required 'channel_id' or 'content'");
        };

        let Some(integration) = ctx.integrations.get("matrix") else {
            return ToolResult::error("matrix integration is not registered");
        };
        let msg = OutboundMessage {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            reply_to: None,
            media_urls: Vec::new(),
            format: MessageFormat::PlainText,
        };
        let guard = integration.lock().await;
        match guard.send_message(&msg).await {
            Ok(event_id) => ToolResult::success_with_data(
                format!("Sent message to {channel_id}"),
                json!({ "message_id": event_id, "channel_id": channel_id, "content": content }),
            ),
            Err(e) => ToolResult::error(format!("send failed: {e}")),
        }
    }
}

/// Replies to a specific message within a federated-chat channel. Grounded
/// on `original_source/chatbot/tools/executor.py`'s `_send_matrix_reply`.
pub struct ReplyChatMessageTool;

#[async_trait]
impl Tool for ReplyChatMessageTool {
    fn name(&self) -> &str {
        "reply_chat_message"
    }

    fn description(&self) -> &str {
        "Reply to a specific message within a federated-chat channel."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel_id": { "type": "string" },
                "reply_to": { "type": "string", "description": "Event id of the message being replied to." },
                "content": { "type": "string" }
            },
            "required": ["channel_id", "reply_to", "content"]
        })
    }

    fn group(&self) -> &str {
        "chat-messaging"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let (Some(channel_id), Some(reply_to), Some(content)) = (
            params.get("channel_id").and_then(|v| v.as_str()),
            params.get("reply_to").and_then(|v| v.as_str()),
            params.get("content").and_then(|v| v.as_str()),
        ) else {
            return ToolResult::error("missing required 'channel_id', 'reply_to', or 'content'");
        };

        let Some(integration) = ctx.integrations.get("matrix") else {
            return ToolResult::error("matrix integration is not registered");
        };
        let msg = OutboundMessage {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            reply_to: Some(reply_to.to_string()),
            media_urls: Vec::new(),
            format: MessageFormat::PlainText,
        };
        let guard = integration.lock().await;
        match guard.reply_to_message(&msg).await {
            Ok(event_id) => ToolResult::success_with_data(
                format!("Replied to {reply_to} in {channel_id}"),
                json!({ "message_id": event_id, "channel_id": channel_id, "content": content }),
            ),
            Err(e) => ToolResult::error(format!("reply failed: {e}")),
        }
    }
}
