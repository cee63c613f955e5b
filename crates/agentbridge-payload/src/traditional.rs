use std::collections::HashMap;

use agentbridge_ratelimit::RateLimiter;
use agentbridge_world::store::WorldState;
use agentbridge_world::types::{Channel, Message};

use crate::bot_activity_context;
use crate::ctx::BuildCtx;
use crate::size;
use crate::types::{
    BotIdentity, ChannelView, MessageView, PayloadStats, SystemStatus, ThreadView,
    TraditionalPayload,
};

/// Builds the traditional-mode payload (spec §4.4): the focus channel gets
/// a detailed view capped at `ai_conversation_history_length` recent
/// messages, every other channel gets a summary-only view, and
/// `action_history` keeps the newest `ai_action_history_length` records
/// with `sender==self` entries filtered out (spec §4.4: "the payload
/// builder only filters out the bot's own action_history entries").
pub fn build_traditional(
    world: &WorldState,
    rate_limiter: &RateLimiter,
    hard_budget_bytes: usize,
    ctx: &BuildCtx,
) -> TraditionalPayload {
    let all_channels = world.all_channels();
    let detail_cap = ctx.retention.ai_conversation_history_length;

    let mut channels = HashMap::new();
    let mut total_messages = 0usize;
    for channel in &all_channels {
        let is_focus = ctx.focus_channel_id.as_deref() == Some(channel.id.as_str());
        total_messages += channel.recent_messages.len();
        channels.insert(channel.id.clone(), channel_view(channel, is_focus, detail_cap));
    }

    let threads = ctx
        .focus_channel_id
        .as_ref()
        .and_then(|focus_id| all_channels.iter().find(|c| &c.id == focus_id))
        .and_then(|channel| build_thread_view(channel, world));

    let action_history = world
        .recent_actions(ctx.retention.ai_action_history_length * 2)
        .into_iter()
        .filter(|a| !a.is_self)
        .rev()
        .take(ctx.retention.ai_action_history_length)
        .rev()
        .map(|a| (&a).into())
        .collect();

    let last_action = world.last_action_result();
    let bot_activity_context = bot_activity_context::build(world, last_action, &ctx.bot_identifiers, ctx.now);

    let system_status = SystemStatus {
        cycle_id: ctx.cycle_id.clone(),
        connection_states: ctx.connection_states.clone(),
        rate_limits: rate_limiter.get_status(ctx.now),
        pending_invites: world.pending_invites(),
    };

    let recent_media = world_recent_media(world);

    let bot_identities = ctx
        .bot_identifiers
        .iter()
        .map(|(platform, id)| BotIdentity {
            platform: *platform,
            id: id.clone(),
        })
        .collect();

    let mut payload = TraditionalPayload {
        current_channel_id: ctx.focus_channel_id.clone(),
        channels,
        threads,
        action_history,
        system_status,
        recent_media,
        bot_activity_context,
        payload_stats: PayloadStats {
            size_bytes: 0,
            size_kb: 0.0,
            channel_count: all_channels.len(),
            message_count: total_messages,
            bot_identities,
        },
    };

    size::reduce_traditional(&mut payload, hard_budget_bytes);
    let size_bytes = serde_json::to_vec(&payload).map(|v| v.len()).unwrap_or(0);
    payload.payload_stats.size_bytes = size_bytes;
    payload.payload_stats.size_kb = size_bytes as f64 / 1024.0;
    if size_bytes > size::SOFT_WARNING_BYTES {
        tracing::warn!(size_bytes, "traditional payload exceeds soft warning threshold");
    }
    payload
}

fn world_recent_media(world: &WorldState) -> Vec<agentbridge_world::types::GeneratedMediaRef> {
    world.get_last_generated_media(3600.0).into_iter().collect()
}

fn channel_view(channel: &Channel, is_focus: bool, detail_cap: usize) -> ChannelView {
    let messages_last_hour = channel.activity_metrics.hourly_timestamps.len();
    let messages_last_24h = channel.activity_metrics.daily_timestamps.len();
    if is_focus {
        let recent_messages = channel
            .recent_messages
            .iter()
            .rev()
            .take(detail_cap)
            .rev()
            .map(message_view)
            .collect();
        ChannelView {
            priority: "detailed",
            platform: channel.platform,
            name: channel.name.clone(),
            topic: channel.topic.clone(),
            member_count: channel.member_count,
            last_activity_ts: channel.last_activity_ts,
            messages_last_hour,
            messages_last_24h,
            recent_messages: Some(recent_messages),
        }
    } else {
        ChannelView {
            priority: "summary_only",
            platform: channel.platform,
            name: channel.name.clone(),
            topic: channel.topic.clone(),
            member_count: channel.member_count,
            last_activity_ts: channel.last_activity_ts,
            messages_last_hour,
            messages_last_24h,
            recent_messages: None,
        }
    }
}

fn message_view(m: &Message) -> MessageView {
    MessageView {
        id: m.id.clone(),
        sender_id: m.sender_id.clone(),
        sender_display: m.sender_display.clone(),
        content: m.content.clone(),
        timestamp: m.timestamp,
        reply_to: m.reply_to.clone(),
        media_urls: m.media_urls.clone(),
    }
}

/// Resolves the thread containing the focus channel's most recent message
/// using only the channel's already-cloned `recent_messages` (walking
/// `reply_to` locally to find the root, since `WorldState` only exposes
/// thread lookup by root id).
fn build_thread_view(channel: &Channel, world: &WorldState) -> Option<ThreadView> {
    let latest = channel.recent_messages.back()?;
    let mut root_id = latest.id.clone();
    let mut current = latest.clone();
    while let Some(parent_id) = &current.reply_to {
        match channel.recent_messages.iter().find(|m| &m.id == parent_id) {
            Some(parent) => {
                root_id = parent.id.clone();
                current = parent.clone();
            }
            None => {
                root_id = parent_id.clone();
                break;
            }
        }
    }

    let messages = world.get_thread(channel.platform, &root_id);
    if messages.len() <= 1 {
        return None;
    }
    Some(ThreadView {
        root_message_id: root_id,
        messages: messages.iter().map(message_view).collect(),
    })
}
