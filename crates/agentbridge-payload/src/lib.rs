pub mod bot_activity_context;
pub mod ctx;
pub mod node;
pub mod size;
pub mod traditional;
pub mod types;

pub use ctx::BuildCtx;
pub use node::{build_node_based, known_node_paths, resolve_node_data};
pub use size::{estimate_traditional_size, SOFT_WARNING_BYTES};
pub use traditional::build_traditional;
pub use types::{NodePayload, TraditionalPayload};
