pub mod client;
pub mod dump;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod types;

pub use client::DecisionClient;
pub use dump::PayloadDumper;
pub use error::{DecisionError, Result};
pub use extract::extract_json;
pub use types::{ActionPlan, DecisionResult, ToolSpec};
