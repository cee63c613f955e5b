use std::sync::Arc;

use agentbridge_channels::IntegrationManager;
use agentbridge_history::HistoryRecorder;
use agentbridge_nodes::NodeManager;
use agentbridge_ratelimit::RateLimiter;
use agentbridge_world::WorldState;

/// Shared handles every tool needs to act on the world and the outside
/// platforms, passed by reference into each `Tool::execute` call (spec
/// §4.6's "shared ActionContext").
#[derive(Clone)]
pub struct ActionContext {
    pub world: Arc<WorldState>,
    pub nodes: Arc<NodeManager>,
    pub rate_limiter: Arc<RateLimiter>,
    pub integrations: Arc<IntegrationManager>,
    pub history: Arc<HistoryRecorder>,
    /// Default channel_id the current cycle is focused on, used by tools
    /// that accept an optional `channel_id` parameter.
    pub focus_channel: Option<String>,
    pub http: reqwest::Client,
    /// HTTP endpoint for the image-generation backend, if configured
    /// (spec §4.6 media tool group). `None` disables `generate_image`.
    pub image_gen_endpoint: Option<String>,
    /// HTTP endpoint for the image-captioning/vision backend, if configured
    /// (spec §4.6 media tool group). `None` disables `describe_image`.
    pub image_describe_endpoint: Option<String>,
}
