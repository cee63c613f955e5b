pub mod db;
pub mod error;
pub mod manager;
pub mod types;

pub use error::{HistoryError, Result};
pub use manager::HistoryRecorder;
pub use types::*;
