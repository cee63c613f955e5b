use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level config (agentbridge.toml + AGENTBRIDGE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBridgeConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub nodes: NodeConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for AgentBridgeConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            cycle: CycleConfig::default(),
            nodes: NodeConfig::default(),
            rate_limits: RateLimitConfig::default(),
            retention: RetentionConfig::default(),
            debug: DebugConfig::default(),
            channels: ChannelsConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl AgentBridgeConfig {
    /// Load config from a TOML file with AGENTBRIDGE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.agentbridge/agentbridge.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: AgentBridgeConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("AGENTBRIDGE_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

/// Same default path `load` falls back to; exposed so callers that need to
/// write the file back (the CLI's `integrations add/remove`) resolve it
/// identically.
pub fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.agentbridge/agentbridge.toml", home)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default = "default_ai_summary_model")]
    pub ai_summary_model: String,
    #[serde(default = "default_ai_endpoint")]
    pub ai_endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Fallback model used after an HTTP 402 (quota exhausted) response.
    pub fallback_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ai_model: default_ai_model(),
            ai_summary_model: default_ai_summary_model(),
            ai_endpoint: default_ai_endpoint(),
            api_key: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            fallback_model: None,
        }
    }
}

fn default_ai_model() -> String {
    "default/chat-model".to_string()
}
fn default_ai_summary_model() -> String {
    "default/summary-model".to_string()
}
fn default_ai_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_observation_interval")]
    pub observation_interval: f64,
    #[serde(default = "default_max_cycles_per_hour")]
    pub max_cycles_per_hour: u32,
    #[serde(default = "default_min_cycle_interval")]
    pub min_cycle_interval: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            observation_interval: default_observation_interval(),
            max_cycles_per_hour: default_max_cycles_per_hour(),
            min_cycle_interval: default_min_cycle_interval(),
        }
    }
}

fn default_observation_interval() -> f64 {
    5.0
}
fn default_max_cycles_per_hour() -> u32 {
    300
}
fn default_min_cycle_interval() -> f64 {
    12.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_max_expanded_nodes")]
    pub max_expanded_nodes: usize,
    #[serde(default = "default_pinned_nodes")]
    pub default_pinned_nodes: Vec<String>,
    #[serde(default)]
    pub enable_two_phase_ai_process: bool,
    #[serde(default = "default_max_exploration_rounds")]
    pub max_exploration_rounds: u32,
    #[serde(default = "default_max_traditional_payload_size")]
    pub max_traditional_payload_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_expanded_nodes: default_max_expanded_nodes(),
            default_pinned_nodes: default_pinned_nodes(),
            enable_two_phase_ai_process: false,
            max_exploration_rounds: default_max_exploration_rounds(),
            max_traditional_payload_size: default_max_traditional_payload_size(),
        }
    }
}

fn default_max_expanded_nodes() -> usize {
    10
}
fn default_pinned_nodes() -> Vec<String> {
    vec![
        "system.rate_limits".to_string(),
        "system.notifications".to_string(),
    ]
}
fn default_max_exploration_rounds() -> u32 {
    3
}
fn default_max_traditional_payload_size() -> usize {
    512 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_burst_window_seconds")]
    pub burst_window_seconds: f64,
    #[serde(default = "default_max_burst_cycles")]
    pub max_burst_cycles: u32,
    #[serde(default = "default_cooldown_multiplier")]
    pub cooldown_multiplier: f64,
    #[serde(default = "default_action_limits")]
    pub action_limits: HashMap<String, u32>,
    #[serde(default = "default_channel_limits")]
    pub channel_limits: HashMap<String, u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst_window_seconds: default_burst_window_seconds(),
            max_burst_cycles: default_max_burst_cycles(),
            cooldown_multiplier: default_cooldown_multiplier(),
            action_limits: default_action_limits(),
            channel_limits: default_channel_limits(),
        }
    }
}

fn default_burst_window_seconds() -> f64 {
    300.0
}
fn default_max_burst_cycles() -> u32 {
    20
}
fn default_cooldown_multiplier() -> f64 {
    1.5
}
fn default_action_limits() -> HashMap<String, u32> {
    let mut m = HashMap::new();
    m.insert("send_chat_message".to_string(), 100);
    m.insert("send_social_post".to_string(), 50);
    m
}
fn default_channel_limits() -> HashMap<String, u32> {
    let mut m = HashMap::new();
    m.insert("federated_chat".to_string(), 50);
    m.insert("social_network".to_string(), 30);
    m
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_conversation_history_length")]
    pub ai_conversation_history_length: usize,
    #[serde(default = "default_action_history_length")]
    pub ai_action_history_length: usize,
    #[serde(default = "default_days_to_keep")]
    pub days_to_keep: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ai_conversation_history_length: default_conversation_history_length(),
            ai_action_history_length: default_action_history_length(),
            days_to_keep: default_days_to_keep(),
        }
    }
}

fn default_conversation_history_length() -> usize {
    50
}
fn default_action_history_length() -> usize {
    100
}
fn default_days_to_keep() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DebugConfig {
    #[serde(default)]
    pub ai_dump_payloads_to_file: bool,
    #[serde(default = "default_payload_dump_directory")]
    pub ai_payload_dump_directory: String,
    #[serde(default = "default_payload_dump_max_files")]
    pub ai_payload_dump_max_files: usize,
}

fn default_payload_dump_directory() -> String {
    "./payload_dumps".to_string()
}
fn default_payload_dump_max_files() -> usize {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    pub matrix: Option<MatrixConfig>,
    pub farcaster: Option<FarcasterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    pub homeserver_url: String,
    pub user_id: String,
    pub access_token: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarcasterConfig {
    pub hub_url: String,
    pub signer_uuid: String,
    pub fid: u64,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.agentbridge/agentbridge.db", home)
}
