use crate::types::Message;
use std::collections::HashMap;

const BATCH_WINDOW_SECS: f64 = 5.0;
const MAX_BATCH_SIZE: usize = 5;

/// Combine rapid-fire messages from the same sender in the same channel,
/// posted within a 5-second window, into a single logical Message with
/// `metadata.batched=true` / `metadata.count=N` (spec §4.1.2). Preserves
/// relative ordering of unrelated senders/channels.
pub fn batch_messages(pending: Vec<Message>) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(pending.len());
    // key = (channel_id, sender_id) -> index into `out` of the open batch head
    let mut open: HashMap<(String, String), usize> = HashMap::new();

    for msg in pending {
        let key = (msg.channel_id.clone(), msg.sender_id.clone());
        if let Some(&idx) = open.get(&key) {
            let head = &mut out[idx];
            let count = head
                .metadata
                .get("count")
                .and_then(|v| v.as_u64())
                .unwrap_or(1);
            if msg.timestamp - head.timestamp <= BATCH_WINDOW_SECS && count < MAX_BATCH_SIZE as u64
            {
                head.content.push('\n');
                head.content.push_str(&msg.content);
                head.timestamp = msg.timestamp;
                head.media_urls.extend(msg.media_urls.clone());
                head.metadata
                    .insert("batched".to_string(), serde_json::Value::Bool(true));
                head.metadata.insert(
                    "count".to_string(),
                    serde_json::Value::Number((count + 1).into()),
                );
                continue;
            }
        }
        open.insert(key, out.len());
        out.push(msg);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_core::types::Platform;

    fn msg(id: &str, sender: &str, ts: f64, content: &str) -> Message {
        Message {
            id: id.into(),
            channel_id: "c1".into(),
            platform: Platform::FederatedChat,
            sender_id: sender.into(),
            sender_display: None,
            content: content.into(),
            timestamp: ts,
            reply_to: None,
            media_urls: vec![],
            metadata: Default::default(),
        }
    }

    #[test]
    fn combines_rapid_fire_messages_from_same_sender() {
        let input = vec![
            msg("1", "alice", 0.0, "hey"),
            msg("2", "alice", 1.0, "are you there"),
            msg("3", "alice", 2.0, "hello?"),
        ];
        let out = batch_messages(input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metadata.get("count").unwrap().as_u64(), Some(3));
    }

    #[test]
    fn does_not_combine_across_the_window() {
        let input = vec![
            msg("1", "alice", 0.0, "hey"),
            msg("2", "alice", 10.0, "still there?"),
        ];
        let out = batch_messages(input);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn does_not_combine_different_senders() {
        let input = vec![msg("1", "alice", 0.0, "hi"), msg("2", "bob", 0.5, "hello")];
        let out = batch_messages(input);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn caps_batch_at_five_messages() {
        let input: Vec<Message> = (0..8)
            .map(|i| msg(&i.to_string(), "alice", i as f64 * 0.5, "spam"))
            .collect();
        let out = batch_messages(input);
        assert!(out.len() > 1);
    }
}
