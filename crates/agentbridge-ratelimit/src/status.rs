use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitUsage {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub cycles_per_hour: u32,
    pub max_cycles_per_hour: u32,
    pub adaptive_multiplier: f64,
    pub cooldown_until: Option<f64>,
    pub action_limits: HashMap<String, LimitUsage>,
    pub channel_limits: HashMap<String, LimitUsage>,
}
