use std::collections::HashMap;

use agentbridge_core::types::Platform;
use agentbridge_world::store::WorldState;
use agentbridge_world::types::{ActionRecord, Channel};

use crate::types::{
    BotActivityContext, ChannelActivitySummary, ConversationPattern, LastActionContext,
};

/// How far back a bot message counts toward activity/pattern detection
/// (spec §4.4.1 "last 5 minutes").
const RECENT_ACTIVITY_WINDOW_SECS: f64 = 300.0;
/// Above this many seconds since the last user message, a channel is flagged
/// `no_recent_user_response` (`_get_conversation_recommendation` source, 10
/// minutes).
const NO_RESPONSE_THRESHOLD_SECS: f64 = 600.0;
const SIMILARITY_THRESHOLD: f64 = 0.7;
const MIN_SIMILARITY_LEN: usize = 20;
const MIN_SIMILARITY_WORDS: usize = 3;

const ANTI_LOOP_INSTRUCTION: &str = "CRITICAL: you just performed the action above. Do NOT \
repeat the same action unless the result indicates you should. Analyze the new information \
and decide the next logical step.";

/// Builds the anti-loop context block (spec §4.4.1), grounded on
/// `bot_activity_context.py::BotActivityContextBuilder`.
pub fn build(
    world: &WorldState,
    last_action: Option<ActionRecord>,
    bot_identifiers: &[(Platform, String)],
    now: f64,
) -> BotActivityContext {
    let last_action_ctx = last_action.map(|record| build_last_action_context(&record, now));

    let mut channel_activity = HashMap::new();
    let mut conversation_patterns = HashMap::new();

    for channel in world.all_channels() {
        let Some(summary) = channel_activity_summary(&channel, bot_identifiers, now) else {
            continue;
        };

        let recent_bot_content: Vec<&str> = channel
            .recent_messages
            .iter()
            .filter(|m| is_bot_sender(bot_identifiers, m.platform, &m.sender_id))
            .filter(|m| now - m.timestamp <= RECENT_ACTIVITY_WINDOW_SECS)
            .rev()
            .take(5)
            .map(|m| m.content.as_str())
            .collect();
        let repetitive = has_repetitive_content(&recent_bot_content);

        let mut flags = Vec::new();
        if summary.recent_bot_messages >= 3 {
            flags.push("high_bot_activity".to_string());
        }
        if summary
            .time_since_last_user_message
            .is_some_and(|secs| secs > NO_RESPONSE_THRESHOLD_SECS)
        {
            flags.push("no_recent_user_response".to_string());
        }
        if repetitive {
            flags.push("repetitive_content".to_string());
        }

        if !flags.is_empty() {
            let recommendation = conversation_recommendation(&flags);
            conversation_patterns.insert(
                channel.id.clone(),
                ConversationPattern {
                    channel_name: channel.name.clone(),
                    flags,
                    recommendation,
                },
            );
        }

        channel_activity.insert(channel.id.clone(), summary);
    }

    BotActivityContext {
        last_action: last_action_ctx,
        channel_activity,
        conversation_patterns,
        anti_loop_instruction: ANTI_LOOP_INSTRUCTION.to_string(),
    }
}

fn is_bot_sender(bot_identifiers: &[(Platform, String)], platform: Platform, sender_id: &str) -> bool {
    bot_identifiers
        .iter()
        .any(|(p, id)| *p == platform && id == sender_id)
}

fn channel_activity_summary(
    channel: &Channel,
    bot_identifiers: &[(Platform, String)],
    now: f64,
) -> Option<ChannelActivitySummary> {
    let cutoff = now - RECENT_ACTIVITY_WINDOW_SECS;
    let mut bot_count = 0usize;
    let mut last_bot_ts = 0.0f64;
    let mut last_user_ts = 0.0f64;

    for msg in &channel.recent_messages {
        if is_bot_sender(bot_identifiers, msg.platform, &msg.sender_id) {
            if msg.timestamp > cutoff {
                bot_count += 1;
                last_bot_ts = last_bot_ts.max(msg.timestamp);
            }
        } else {
            last_user_ts = last_user_ts.max(msg.timestamp);
        }
    }

    if bot_count == 0 {
        return None;
    }

    Some(ChannelActivitySummary {
        channel_name: channel.name.clone(),
        recent_bot_messages: bot_count,
        last_bot_message_time: last_bot_ts,
        last_user_message_time: last_user_ts,
        time_since_last_user_message: if last_user_ts > 0.0 {
            Some(now - last_user_ts)
        } else {
            None
        },
    })
}

fn has_repetitive_content(recent_bot_content: &[&str]) -> bool {
    for i in 0..recent_bot_content.len() {
        for j in (i + 1)..recent_bot_content.len() {
            if messages_are_similar(recent_bot_content[i], recent_bot_content[j]) {
                return true;
            }
        }
    }
    false
}

/// Token-overlap similarity check (spec §4.4.1: ratio >= 0.7 over the last 5
/// bot messages per channel), ported from `_messages_are_similar`.
fn messages_are_similar(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let a_trim = a_lower.trim();
    let b_trim = b_lower.trim();

    if a_trim == b_trim {
        return true;
    }

    if a_trim.len() > MIN_SIMILARITY_LEN && b_trim.len() > MIN_SIMILARITY_LEN {
        let (shorter, longer) = if a_trim.len() < b_trim.len() {
            (a_trim, b_trim)
        } else {
            (b_trim, a_trim)
        };
        if longer.contains(shorter) {
            return true;
        }
    }

    let words_a: std::collections::HashSet<&str> = a_trim.split_whitespace().collect();
    let words_b: std::collections::HashSet<&str> = b_trim.split_whitespace().collect();
    if words_a.len() > MIN_SIMILARITY_WORDS && words_b.len() > MIN_SIMILARITY_WORDS {
        let overlap = words_a.intersection(&words_b).count();
        let union = words_a.union(&words_b).count();
        if union > 0 {
            return (overlap as f64 / union as f64) >= SIMILARITY_THRESHOLD;
        }
    }

    false
}

fn conversation_recommendation(flags: &[String]) -> String {
    let has = |f: &str| flags.iter().any(|x| x == f);
    if has("repetitive_content") && has("no_recent_user_response") {
        "WAIT - avoid sending more messages until the user responds".to_string()
    } else if has("repetitive_content") {
        "VARY_RESPONSE - try a different approach or wait for user input".to_string()
    } else if has("high_bot_activity") && has("no_recent_user_response") {
        "PAUSE - consider waiting for user engagement".to_string()
    } else if has("high_bot_activity") {
        "MODERATE - reduce message frequency".to_string()
    } else {
        "NORMAL - continue normal conversation flow".to_string()
    }
}

fn build_last_action_context(record: &ActionRecord, now: f64) -> LastActionContext {
    let guidance = action_specific_guidance(&record.action_kind, record.success, record);
    LastActionContext {
        action_type: record.action_kind.clone(),
        parameters_summary: record.parameters.clone(),
        success: record.success,
        result_preview: truncate(&record.result.to_string(), 200),
        reasoning: record
            .reasoning
            .clone()
            .unwrap_or_else(|| "No reasoning provided".to_string()),
        seconds_since: (now - record.timestamp).max(0.0),
        guidance,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Action-specific anti-loop guidance, ported from
/// `_generate_action_specific_guidance` with action names renamed to this
/// system's tool catalog.
fn action_specific_guidance(action_type: &str, success: bool, record: &ActionRecord) -> String {
    if !success {
        return format!(
            "Your last action ({action_type}) failed. Consider why it failed and try a different approach or fix the issue."
        );
    }

    match action_type {
        "expand_node" => {
            let node_path = record
                .parameters
                .get("node_path")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            format!(
                "You just expanded node '{node_path}'. The new information is now available. \
Analyze it and respond appropriately instead of expanding another node."
            )
        }
        "send_chat_message" | "reply_chat_message" | "send_social_post" | "reply_social_post" => {
            "You just sent a message. Wait for responses or focus on other activities rather \
than sending another message immediately."
                .to_string()
        }
        "search" => "You just performed a search. Review the results and engage with relevant \
content or move to other tasks."
            .to_string(),
        "wait" => "You just waited. Now analyze if there are any new developments that require \
action, or continue waiting if appropriate."
            .to_string(),
        "react" => "You just reacted to a message. Consider if further engagement is needed or \
move to other activities."
            .to_string(),
        "accept_invite" | "leave_room" => "You just changed your room membership. Focus on \
participating in conversations or other activities."
            .to_string(),
        "generate_image" => "You just generated media content. Consider sharing it or using it \
in conversations rather than generating more media immediately."
            .to_string(),
        "store_memory" => "You just stored information for later use. Use it to enhance future \
interactions rather than immediately storing more."
            .to_string(),
        "collapse_node" | "pin_node" | "unpin_node" => "You just adjusted node visibility. \
Analyze what's now exposed rather than adjusting further nodes immediately."
            .to_string(),
        other => format!(
            "You just completed '{other}'. Build on this action's results rather than repeating \
the same analysis or action type."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_repeat_is_similar() {
        assert!(messages_are_similar("hello there friend", "hello there friend"));
    }

    #[test]
    fn high_word_overlap_is_similar() {
        assert!(messages_are_similar(
            "the quick brown fox jumps over the lazy dog",
            "the quick brown fox leaps over the lazy dog"
        ));
    }

    #[test]
    fn unrelated_short_messages_are_not_similar() {
        assert!(!messages_are_similar("hi", "bye"));
    }

    #[test]
    fn recommendation_prioritizes_wait_over_other_flags() {
        let flags = vec![
            "repetitive_content".to_string(),
            "no_recent_user_response".to_string(),
            "high_bot_activity".to_string(),
        ];
        assert!(conversation_recommendation(&flags).starts_with("WAIT"));
    }
}
