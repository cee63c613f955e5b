use std::collections::HashMap;

use agentbridge_core::types::Platform;
use agentbridge_nodes::manager::NodeManager;
use agentbridge_ratelimit::RateLimiter;
use agentbridge_world::store::WorldState;
use serde_json::{json, Value};

use crate::ctx::BuildCtx;
use crate::types::{
    BotIdentity, CollapsedNodeSummary, ExpansionStatusView, NodePayload, PayloadStats, SystemStatus,
};
use crate::size;

/// `system.*` node paths always exist; `channels.<platform>.<channel_id>`
/// paths exist once the channel is known to the world state. This is the
/// node-path convention node-based payloads address data by (spec §4.3
/// treats node paths as opaque strings; this crate is where they're given
/// meaning).
pub fn known_node_paths(world: &WorldState) -> Vec<String> {
    let mut paths = vec!["system.rate_limits".to_string(), "system.notifications".to_string()];
    for channel in world.all_channels() {
        paths.push(channel_path(channel.platform, &channel.id));
    }
    paths
}

fn channel_path(platform: Platform, channel_id: &str) -> String {
    format!("channels.{}.{}", platform, channel_id)
}

/// Resolves a node path to its current raw data, shared between
/// `build_node_based` and the Orchestrator's changed-summary refresh pass.
pub fn resolve_node_data(path: &str, world: &WorldState, rate_limiter: &RateLimiter, now: f64) -> Value {
    if path == "system.rate_limits" {
        return serde_json::to_value(rate_limiter.get_status(now)).unwrap_or(Value::Null);
    }
    if path == "system.notifications" {
        return json!({
            "pending_invites": world.pending_invites(),
            "undecryptable_events": world.undecryptable_events(),
        });
    }
    if let Some(channel_id) = path.strip_prefix("channels.").and_then(|rest| rest.split_once('.').map(|(_, id)| id)) {
        if let Some(channel) = world.get_channel(channel_id) {
            return serde_json::to_value(&channel).unwrap_or(Value::Null);
        }
    }
    Value::Null
}

/// Builds the node-based payload (spec §4.4): every known node path is
/// either fully expanded (its resolved data, verbatim) or represented by a
/// collapsed summary, driven entirely by `NodeManager`'s expansion state.
pub fn build_node_based(
    world: &WorldState,
    node_manager: &NodeManager,
    rate_limiter: &RateLimiter,
    hard_budget_bytes: usize,
    ctx: &BuildCtx,
) -> NodePayload {
    let paths = known_node_paths(world);

    let mut expanded_nodes = HashMap::new();
    let mut collapsed_node_summaries = HashMap::new();

    for path in &paths {
        let data = resolve_node_data(path, world, rate_limiter, ctx.now);
        let is_expanded = node_manager
            .get_node(path)
            .map(|n| n.is_expanded)
            .unwrap_or(false);

        if is_expanded {
            expanded_nodes.insert(path.clone(), data);
        } else {
            let meta = node_manager.get_node(path);
            let summary = meta
                .as_ref()
                .map(|n| n.ai_summary.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Not yet summarized — expand this node for detail.".to_string());
            let data_changed = node_manager.is_data_changed(path, &data);
            collapsed_node_summaries.insert(
                path.clone(),
                CollapsedNodeSummary {
                    summary,
                    data_changed,
                    last_summary_ts: meta.map(|n| n.last_summary_ts).unwrap_or(0.0),
                },
            );
        }
    }

    let expansion_status = node_manager.get_expansion_status();

    let system_status = SystemStatus {
        cycle_id: ctx.cycle_id.clone(),
        connection_states: ctx.connection_states.clone(),
        rate_limits: rate_limiter.get_status(ctx.now),
        pending_invites: world.pending_invites(),
    };

    let bot_identities = ctx
        .bot_identifiers
        .iter()
        .map(|(platform, id)| BotIdentity {
            platform: *platform,
            id: id.clone(),
        })
        .collect();

    let mut payload = NodePayload {
        current_channel_id: ctx.focus_channel_id.clone(),
        system_status,
        expanded_nodes,
        collapsed_node_summaries,
        expansion_status: ExpansionStatusView {
            expanded: expansion_status.expanded,
            pinned: expansion_status.pinned,
            capacity: expansion_status.capacity,
        },
        system_events: node_manager.recent_system_events(),
        payload_stats: PayloadStats {
            size_bytes: 0,
            size_kb: 0.0,
            channel_count: world.all_channels().len(),
            message_count: 0,
            bot_identities,
        },
    };

    size::reduce_node_based(&mut payload, hard_budget_bytes);
    let size_bytes = serde_json::to_vec(&payload).map(|v| v.len()).unwrap_or(0);
    payload.payload_stats.size_bytes = size_bytes;
    payload.payload_stats.size_kb = size_bytes as f64 / 1024.0;
    if size_bytes > size::SOFT_WARNING_BYTES {
        tracing::warn!(size_bytes, "node-based payload exceeds soft warning threshold");
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_core::config::RateLimitConfig;
    use agentbridge_world::types::{Channel, ChannelStatus};

    fn ctx() -> BuildCtx {
        BuildCtx {
            cycle_id: agentbridge_core::types::CycleId::new(),
            focus_channel_id: None,
            now: 1000.0,
            retention: Default::default(),
            nodes: Default::default(),
            bot_identifiers: vec![],
            connection_states: HashMap::new(),
        }
    }

    #[test]
    fn known_paths_cover_system_and_channels() {
        let world = WorldState::new();
        let mut ch = Channel::new("room1", Platform::FederatedChat, "Room One");
        ch.status = ChannelStatus::Joined;
        world.upsert_channel(ch);

        let paths = known_node_paths(&world);
        assert!(paths.contains(&"system.rate_limits".to_string()));
        assert!(paths.contains(&"system.notifications".to_string()));
        assert!(paths.contains(&"channels.federated_chat.room1".to_string()));
    }

    #[test]
    fn unexpanded_nodes_become_collapsed_summaries() {
        let world = WorldState::new();
        let node_manager = NodeManager::new(10, &[]);
        let rate_limiter = RateLimiter::new(RateLimitConfig::default(), 300, 12.0);

        let payload = build_node_based(&world, &node_manager, &rate_limiter, 1_000_000, &ctx());
        assert!(payload.expanded_nodes.is_empty());
        assert!(payload
            .collapsed_node_summaries
            .contains_key("system.rate_limits"));
    }

    #[test]
    fn expanding_a_node_moves_it_out_of_collapsed_summaries() {
        let world = WorldState::new();
        let node_manager = NodeManager::new(10, &[]);
        let rate_limiter = RateLimiter::new(RateLimitConfig::default(), 300, 12.0);
        node_manager.expand("system.rate_limits");

        let payload = build_node_based(&world, &node_manager, &rate_limiter, 1_000_000, &ctx());
        assert!(payload.expanded_nodes.contains_key("system.rate_limits"));
        assert!(!payload
            .collapsed_node_summaries
            .contains_key("system.rate_limits"));
    }
}
