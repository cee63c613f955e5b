use crate::types::{ActivityMetrics, Message};

const HOUR_SECS: f64 = 3600.0;
const DAY_SECS: f64 = 86_400.0;
const MAX_KEYWORDS: usize = 20;
const MIN_KEYWORD_LEN: usize = 4;

const STOPWORDS: &[&str] = &[
    "that", "this", "with", "from", "have", "will", "your", "just", "what", "when", "there",
    "their", "about", "would", "could", "should", "they", "them", "then", "here", "into",
];

/// Record a new message's timestamp, sender, and keywords into a channel's
/// rolling activity window, purging entries outside 1h/24h (spec §4.1.1).
pub fn record_activity(metrics: &mut ActivityMetrics, msg: &Message) {
    purge(metrics, msg.timestamp);

    metrics.hourly_timestamps.push_back(msg.timestamp);
    metrics.daily_timestamps.push_back(msg.timestamp);
    metrics.senders_last_hour.insert(msg.sender_id.clone());

    for token in tokenize(&msg.content) {
        if metrics.keywords_last_hour.len() >= MAX_KEYWORDS {
            break;
        }
        metrics.keywords_last_hour.insert(token);
    }
}

fn purge(metrics: &mut ActivityMetrics, now: f64) {
    while metrics
        .hourly_timestamps
        .front()
        .is_some_and(|ts| now - ts > HOUR_SECS)
    {
        metrics.hourly_timestamps.pop_front();
    }
    while metrics
        .daily_timestamps
        .front()
        .is_some_and(|ts| now - ts > DAY_SECS)
    {
        metrics.daily_timestamps.pop_front();
    }
    if metrics.hourly_timestamps.is_empty() {
        metrics.senders_last_hour.clear();
        metrics.keywords_last_hour.clear();
    }
}

fn tokenize(content: &str) -> Vec<String> {
    content
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.len() > MIN_KEYWORD_LEN - 1 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(ts: f64, content: &str) -> Message {
        Message {
            id: "1".into(),
            channel_id: "c".into(),
            platform: agentbridge_core::types::Platform::FederatedChat,
            sender_id: "alice".into(),
            sender_display: None,
            content: content.to_string(),
            timestamp: ts,
            reply_to: None,
            media_urls: vec![],
            metadata: Default::default(),
        }
    }

    #[test]
    fn purges_entries_older_than_an_hour() {
        let mut metrics = ActivityMetrics::default();
        record_activity(&mut metrics, &msg(0.0, "hello world"));
        record_activity(&mut metrics, &msg(HOUR_SECS + 1.0, "another message"));
        assert_eq!(metrics.hourly_timestamps.len(), 1);
    }

    #[test]
    fn caps_keywords_at_twenty() {
        let mut metrics = ActivityMetrics::default();
        let content: String = (0..30).map(|i| format!("keyword{} ", i)).collect();
        record_activity(&mut metrics, &msg(0.0, &content));
        assert!(metrics.keywords_last_hour.len() <= MAX_KEYWORDS);
    }
}
