use async_trait::async_trait;
use serde_json::{json, Value};

use agentbridge_world::types::GeneratedMediaRef;

use crate::context::ActionContext;
use crate::registry::{Tool, ToolResult};

/// Generates an image via the configured image-generation backend and
/// registers it in world state so a subsequent `send_social_post`/
/// `reply_social_post` in the same cycle can pick it up automatically
/// (spec §4.6 media group / generate-then-post coordination).
pub struct GenerateImageTool;

#[async_trait]
impl Tool for GenerateImageTool {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt for use in a follow-up post."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string" },
                "aspect_ratio": { "type": "string", "default": "1:1" }
            },
            "required": ["prompt"]
        })
    }

    fn group(&self) -> &str {
        "media"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(prompt) = params.get("prompt").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'prompt'");
        };
        let aspect_ratio = params
            .get("aspect_ratio")
            .and_then(|v| v.as_str())
            .unwrap_or("1:1")
            .to_string();

        let Some(endpoint) = ctx.image_gen_endpoint.clone() else {
            return ToolResult::error("no image generation backend configured");
        };

        let resp = ctx
            .http
            .post(&endpoint)
            .json(&json!({ "prompt": prompt, "aspect_ratio": aspect_ratio }))
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("image generation request failed: {e}")),
        };
        if !resp.status().is_success() {
            let status = resp.status();
            return ToolResult::error(format!("image generation backend returned {status}"));
        }
        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(format!("invalid image generation response: {e}")),
        };

        let url = body.get("url").and_then(|v| v.as_str()).unwrap_or_default();
        if url.is_empty() {
            return ToolResult::error("image generation response missing 'url'");
        }
        let storage_url = body
            .get("storage_url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let media_id = uuid::Uuid::new_v4().to_string();

        ctx.world.register_generated_media(GeneratedMediaRef {
            media_id: media_id.clone(),
            url: url.to_string(),
            storage_url,
            prompt: prompt.to_string(),
            aspect_ratio: Some(aspect_ratio),
            created_at: agentbridge_core::types::now_secs(),
        });

        ToolResult::success_with_data(
            format!("Generated image for prompt: {prompt}"),
            json!({ "media_id": media_id, "media_url": url }),
        )
    }
}

/// Describes an image via the configured vision/captioning backend, for
/// reading media a channel participant posted rather than producing new
/// media (spec §1 "generate or describe images", SPEC_FULL §10 media group).
pub struct DescribeImageTool;

#[async_trait]
impl Tool for DescribeImageTool {
    fn name(&self) -> &str {
        "describe_image"
    }

    fn description(&self) -> &str {
        "Describe the contents of an image at a given URL."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_url": { "type": "string" },
                "question": { "type": "string" }
            },
            "required": ["image_url"]
        })
    }

    fn group(&self) -> &str {
        "media"
    }

    async fn execute(&self, params: Value, ctx: &ActionContext) -> ToolResult {
        let Some(image_url) = params.get("image_url").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required 'image_url'");
        };
        let question = params.get("question").and_then(|v| v.as_str());

        let Some(endpoint) = ctx.image_describe_endpoint.clone() else {
            return ToolResult::error("no image description backend configured");
        };

        let mut body = json!({ "image_url": image_url });
        if let Some(q) = question {
            body["question"] = json!(q);
        }

        let resp = ctx.http.post(&endpoint).json(&body).send().await;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("image description request failed: {e}")),
        };
        if !resp.status().is_success() {
            let status = resp.status();
            return ToolResult::error(format!("image description backend returned {status}"));
        }
        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(format!("invalid image description response: {e}")),
        };

        let description = body.get("description").and_then(|v| v.as_str()).unwrap_or_default();
        if description.is_empty() {
            return ToolResult::error("image description response missing 'description'");
        }

        ToolResult::success_with_data(
            description.to_string(),
            json!({ "image_url": image_url, "description": description }),
        )
    }
}
