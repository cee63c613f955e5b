pub mod channel;
pub mod error;
pub mod manager;
pub mod types;

pub use channel::Integration;
pub use error::ChannelError;
pub use manager::IntegrationManager;
pub use types::{ChannelStatus, InboundMessage, MessageFormat, Observation, OutboundMessage};
