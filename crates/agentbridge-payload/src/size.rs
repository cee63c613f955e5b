use crate::types::{CollapsedNodeSummary, NodePayload, TraditionalPayload};
use std::collections::HashMap;
use tracing::warn;

/// Soft warning threshold carried from `ai_engine.py`'s 512 KB payload-size
/// warning (SPEC_FULL §2 "Payload byte-size instrumentation").
pub const SOFT_WARNING_BYTES: usize = 512 * 1024;

/// Rough pre-build size estimate from entity counts, used by the
/// Orchestrator to choose traditional vs node-based mode before a payload is
/// actually built (spec §4.4.2).
pub fn estimate_traditional_size(channel_count: usize, message_count: usize, action_count: usize) -> usize {
    const BYTES_PER_CHANNEL_SUMMARY: usize = 200;
    const BYTES_PER_MESSAGE: usize = 350;
    const BYTES_PER_ACTION: usize = 300;
    const FIXED_OVERHEAD: usize = 2048;

    FIXED_OVERHEAD
        + channel_count * BYTES_PER_CHANNEL_SUMMARY
        + message_count * BYTES_PER_MESSAGE
        + action_count * BYTES_PER_ACTION
}

fn serialized_size<T: serde::Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

/// Progressively shrinks a traditional payload until it fits `hard_budget`
/// bytes, or until no more reduction is possible (spec §4.4.2): first caps
/// each detailed channel's message list further, then truncates long
/// message bodies with `…` markers.
pub fn reduce_traditional(payload: &mut TraditionalPayload, hard_budget: usize) {
    let mut size = serialized_size(payload);
    if size <= hard_budget {
        return;
    }
    warn!(size, hard_budget, "traditional payload exceeds hard budget, reducing");

    for cap in [25usize, 10, 5, 1] {
        for channel in payload.channels.values_mut() {
            if let Some(messages) = &mut channel.recent_messages {
                if messages.len() > cap {
                    let start = messages.len() - cap;
                    *messages = messages.split_off(start);
                }
            }
        }
        size = serialized_size(payload);
        if size <= hard_budget {
            return;
        }
    }

    for max_len in [500usize, 200, 80] {
        for channel in payload.channels.values_mut() {
            if let Some(messages) = &mut channel.recent_messages {
                for m in messages.iter_mut() {
                    truncate_with_marker(&mut m.content, max_len);
                }
            }
        }
        if let Some(thread) = &mut payload.threads {
            for m in thread.messages.iter_mut() {
                truncate_with_marker(&mut m.content, max_len);
            }
        }
        size = serialized_size(payload);
        if size <= hard_budget {
            return;
        }
    }

    warn!(size, hard_budget, "traditional payload still over budget after reduction");
}

/// Progressively shrinks a node-based payload: drops the least recently
/// refreshed collapsed-node summaries first, then truncates any remaining
/// long text fields (spec §4.4.2 point (b)/(c)).
pub fn reduce_node_based(payload: &mut NodePayload, hard_budget: usize) {
    let mut size = serialized_size(payload);
    if size <= hard_budget {
        return;
    }
    warn!(size, hard_budget, "node-based payload exceeds hard budget, reducing");

    let mut by_age: Vec<(String, f64)> = payload
        .collapsed_node_summaries
        .iter()
        .map(|(path, s)| (path.clone(), s.last_summary_ts))
        .collect();
    by_age.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    for (path, _) in by_age {
        if size <= hard_budget {
            break;
        }
        payload.collapsed_node_summaries.remove(&path);
        size = serialized_size(payload);
    }

    if size > hard_budget {
        truncate_node_text(&mut payload.expanded_nodes, &mut payload.collapsed_node_summaries, 200);
        size = serialized_size(payload);
    }

    if size > hard_budget {
        warn!(size, hard_budget, "node-based payload still over budget after reduction");
    }
}

fn truncate_node_text(
    expanded: &mut HashMap<String, serde_json::Value>,
    collapsed: &mut HashMap<String, CollapsedNodeSummary>,
    max_len: usize,
) {
    for summary in collapsed.values_mut() {
        truncate_with_marker(&mut summary.summary, max_len);
    }
    for value in expanded.values_mut() {
        truncate_value_strings(value, max_len);
    }
}

fn truncate_value_strings(value: &mut serde_json::Value, max_len: usize) {
    match value {
        serde_json::Value::String(s) => truncate_with_marker(s, max_len),
        serde_json::Value::Array(items) => {
            for item in items {
                truncate_value_strings(item, max_len);
            }
        }
        serde_json::Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                truncate_value_strings(v, max_len);
            }
        }
        _ => {}
    }
}

fn truncate_with_marker(s: &mut String, max_chars: usize) {
    if s.chars().count() > max_chars {
        let mut truncated: String = s.chars().take(max_chars).collect();
        truncated.push('…');
        *s = truncated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_counts() {
        let small = estimate_traditional_size(1, 1, 1);
        let large = estimate_traditional_size(10, 100, 50);
        assert!(large > small);
    }

    #[test]
    fn truncate_adds_marker_only_when_over_length() {
        let mut s = "short".to_string();
        truncate_with_marker(&mut s, 10);
        assert_eq!(s, "short");

        let mut long = "a".repeat(20);
        truncate_with_marker(&mut long, 10);
        assert_eq!(long.chars().count(), 11);
        assert!(long.ends_with('…'));
    }
}
