use serde::{Deserialize, Serialize};
use std::fmt;

/// The two platform kinds this system observes: a federated-chat platform
/// (Matrix) and a decentralized social-network platform (Farcaster).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    FederatedChat,
    SocialNetwork,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::FederatedChat => "federated_chat",
            Platform::SocialNetwork => "social_network",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "federated_chat" | "matrix" => Ok(Platform::FederatedChat),
            "social_network" | "farcaster" => Ok(Platform::SocialNetwork),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Unique identifier for a cycle of the orchestrator loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub String);

impl CycleId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current unix time as floating-point seconds (the data model's timestamp unit).
pub fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
