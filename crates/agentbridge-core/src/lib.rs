pub mod config;
pub mod error;
pub mod types;

pub use config::AgentBridgeConfig;
pub use error::{CoreError, Result};
