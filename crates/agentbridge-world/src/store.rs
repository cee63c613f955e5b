use crate::activity;
use crate::types::*;
use agentbridge_core::types::Platform;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

struct Inner {
    channels: HashMap<String, Channel>,
    users: HashMap<(Platform, String), User>,
    /// root_message_id -> ordered list of message ids (thread index, spec §9:
    /// replaces the source's object-graph cycles with an id-keyed index).
    threads: HashMap<String, Vec<String>>,
    messages_by_id: HashMap<(Platform, String), Message>,
    dedup: HashSet<(Platform, String)>,
    action_history: VecDeque<ActionRecord>,
    last_action_result: Option<ActionRecord>,
    rate_snapshots: HashMap<String, RateLimitSnapshot>,
    pending_invites: HashMap<String, PendingInvite>,
    generated_media: VecDeque<GeneratedMediaRef>,
    undecryptable: HashMap<(String, String), UndecryptableEvent>,
}

impl Inner {
    fn new() -> Self {
        Self {
            channels: HashMap::new(),
            users: HashMap::new(),
            threads: HashMap::new(),
            messages_by_id: HashMap::new(),
            dedup: HashSet::new(),
            action_history: VecDeque::new(),
            last_action_result: None,
            rate_snapshots: HashMap::new(),
            pending_invites: HashMap::new(),
            generated_media: VecDeque::new(),
            undecryptable: HashMap::new(),
        }
    }
}

/// Thread-safe authoritative in-memory model of platforms, channels,
/// messages, threads, users, action history, rate-limit snapshots, pending
/// invites, and generated media (spec §4.1 / C1). All mutating methods
/// serialize through a single exclusive lock; read methods return owned
/// clones so callers cannot mutate store-internal state.
pub struct WorldState {
    inner: Mutex<Inner>,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Appends `msg` if `(platform, id)` has not been seen before. Returns
    /// `false` (no-op) on duplicate ingestion — the dedup set is authoritative
    /// and never cleared for the lifetime of the store.
    pub fn add_message(&self, msg: Message) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let key = (msg.platform, msg.id.clone());
        if inner.dedup.contains(&key) {
            return false;
        }
        inner.dedup.insert(key.clone());

        let channel = inner
            .channels
            .entry(msg.channel_id.clone())
            .or_insert_with(|| Channel::new(msg.channel_id.clone(), msg.platform, msg.channel_id.clone()));

        activity::record_activity(&mut channel.activity_metrics, &msg);
        channel.last_activity_ts = msg.timestamp;

        insert_sorted(&mut channel.recent_messages, msg.clone());
        while channel.recent_messages.len() > RECENT_MESSAGES_CAP {
            channel.recent_messages.pop_front();
        }

        if let Some(root) = &msg.reply_to {
            let root_id = thread_root(&inner.messages_by_id, msg.platform, root);
            inner.threads.entry(root_id).or_default().push(msg.id.clone());
        }

        inner.messages_by_id.insert(key, msg);
        true
    }

    /// Appends an executed action outcome; trims in-memory retention to the
    /// newest 100 (spec invariant: newest record always at the tail).
    pub fn add_action_result(&self, record: ActionRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.action_history.push_back(record);
        while inner.action_history.len() > ACTION_HISTORY_CAP {
            inner.action_history.pop_front();
        }
    }

    pub fn set_last_action_result(&self, record: ActionRecord) {
        self.inner.lock().unwrap().last_action_result = Some(record);
    }

    pub fn last_action_result(&self) -> Option<ActionRecord> {
        self.inner.lock().unwrap().last_action_result.clone()
    }

    pub fn recent_actions(&self, limit: usize) -> Vec<ActionRecord> {
        let inner = self.inner.lock().unwrap();
        inner
            .action_history
            .iter()
            .rev()
            .take(limit)
            .rev()
            .cloned()
            .collect()
    }

    pub fn update_channel_status(&self, channel_id: &str, status: ChannelStatus) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ch) = inner.channels.get_mut(channel_id) {
            ch.status = status;
        }
    }

    pub fn get_channel(&self, channel_id: &str) -> Option<Channel> {
        self.inner.lock().unwrap().channels.get(channel_id).cloned()
    }

    pub fn all_channels(&self) -> Vec<Channel> {
        self.inner.lock().unwrap().channels.values().cloned().collect()
    }

    pub fn upsert_channel(&self, channel: Channel) {
        self.inner.lock().unwrap().channels.insert(channel.id.clone(), channel);
    }

    pub fn upsert_user(&self, user: User) {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert((user.platform, user.id.clone()), user);
    }

    pub fn get_user(&self, platform: Platform, id: &str) -> Option<User> {
        self.inner
            .lock()
            .unwrap()
            .users
            .get(&(platform, id.to_string()))
            .cloned()
    }

    /// Returns the ordered list of messages in the thread rooted at `root_id`,
    /// newest last, derived lazily from the `reply_to` index (spec §3 Thread).
    pub fn get_thread(&self, platform: Platform, root_id: &str) -> Vec<Message> {
        let inner = self.inner.lock().unwrap();
        let mut out = Vec::new();
        if let Some(root_msg) = inner.messages_by_id.get(&(platform, root_id.to_string())) {
            out.push(root_msg.clone());
        }
        if let Some(ids) = inner.threads.get(root_id) {
            for id in ids {
                if let Some(m) = inner.messages_by_id.get(&(platform, id.clone())) {
                    out.push(m.clone());
                }
            }
        }
        out
    }

    pub fn register_generated_media(&self, media: GeneratedMediaRef) {
        let mut inner = self.inner.lock().unwrap();
        inner.generated_media.push_back(media);
        let cutoff = agentbridge_core::types::now_secs() - 3600.0;
        while inner
            .generated_media
            .front()
            .is_some_and(|m| m.created_at < cutoff)
        {
            inner.generated_media.pop_front();
        }
    }

    /// Returns the most recently generated media within `within_seconds`,
    /// used to attach an image/video to a follow-up post (spec §4.6).
    pub fn get_last_generated_media(&self, within_seconds: f64) -> Option<GeneratedMediaRef> {
        let inner = self.inner.lock().unwrap();
        let now = agentbridge_core::types::now_secs();
        inner
            .generated_media
            .iter()
            .rev()
            .find(|m| now - m.created_at <= within_seconds)
            .cloned()
    }

    pub fn set_rate_limit_snapshot(&self, api_name: &str, snapshot: RateLimitSnapshot) {
        self.inner
            .lock()
            .unwrap()
            .rate_snapshots
            .insert(api_name.to_string(), snapshot);
    }

    pub fn get_rate_limit_snapshot(&self, api_name: &str) -> Option<RateLimitSnapshot> {
        self.inner.lock().unwrap().rate_snapshots.get(api_name).cloned()
    }

    pub fn all_rate_limit_snapshots(&self) -> HashMap<String, RateLimitSnapshot> {
        self.inner.lock().unwrap().rate_snapshots.clone()
    }

    pub fn add_pending_invite(&self, invite: PendingInvite) {
        self.inner
            .lock()
            .unwrap()
            .pending_invites
            .insert(invite.channel_id.clone(), invite);
    }

    pub fn remove_pending_invite(&self, channel_id: &str) {
        self.inner.lock().unwrap().pending_invites.remove(channel_id);
    }

    pub fn pending_invites(&self) -> Vec<PendingInvite> {
        self.inner.lock().unwrap().pending_invites.values().cloned().collect()
    }

    /// Enqueues an undecryptable event for retry, or bumps its retry count
    /// if already tracked. Returns `false` once `max_retries` is exceeded,
    /// signalling the caller to drop the record (spec §8 scenario 6).
    pub fn record_undecryptable_retry(&self, event_id: &str, channel_id: &str, sender: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let key = (event_id.to_string(), channel_id.to_string());
        let entry = inner
            .undecryptable
            .entry(key.clone())
            .or_insert_with(|| UndecryptableEvent::new(event_id, channel_id, sender));
        entry.retry_count += 1;
        entry.last_retry_ts = agentbridge_core::types::now_secs();
        if entry.retry_count >= entry.max_retries {
            inner.undecryptable.remove(&key);
            return false;
        }
        true
    }

    pub fn undecryptable_events(&self) -> Vec<UndecryptableEvent> {
        self.inner.lock().unwrap().undecryptable.values().cloned().collect()
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_sorted(buf: &mut VecDeque<Message>, msg: Message) {
    let pos = buf
        .iter()
        .rposition(|m| m.timestamp <= msg.timestamp)
        .map(|p| p + 1)
        .unwrap_or(0);
    buf.insert(pos, msg);
}

fn thread_root(
    messages: &HashMap<(Platform, String), Message>,
    platform: Platform,
    mut id: &str,
) -> String {
    let owned;
    loop {
        match messages.get(&(platform, id.to_string())).and_then(|m| m.reply_to.as_deref()) {
            Some(parent) => {
                owned = parent.to_string();
                id = &owned;
            }
            None => return id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_core::types::Platform;

    fn msg(id: &str, ts: f64) -> Message {
        Message {
            id: id.into(),
            channel_id: "c1".into(),
            platform: Platform::FederatedChat,
            sender_id: "alice".into(),
            sender_display: None,
            content: "hello world".into(),
            timestamp: ts,
            reply_to: None,
            media_urls: vec![],
            metadata: Default::default(),
        }
    }

    #[test]
    fn dedup_only_first_call_succeeds() {
        let store = WorldState::new();
        assert!(store.add_message(msg("m1", 1.0)));
        assert!(!store.add_message(msg("m1", 2.0)));
    }

    #[test]
    fn recent_messages_capped_and_ordered() {
        let store = WorldState::new();
        for i in 0..60 {
            store.add_message(msg(&format!("m{}", i), i as f64));
        }
        let ch = store.get_channel("c1").unwrap();
        assert!(ch.recent_messages.len() <= RECENT_MESSAGES_CAP);
        let timestamps: Vec<f64> = ch.recent_messages.iter().map(|m| m.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn action_history_capped_newest_at_tail() {
        let store = WorldState::new();
        for i in 0..150 {
            store.add_action_result(ActionRecord {
                id: i.to_string(),
                action_kind: "wait".into(),
                parameters: serde_json::json!({}),
                result: serde_json::json!({}),
                success: true,
                channel_id: None,
                platform: None,
                timestamp: i as f64,
                duration_ms: None,
                reasoning: None,
                is_self: true,
            });
        }
        let history = store.recent_actions(ACTION_HISTORY_CAP + 50);
        assert_eq!(history.len(), ACTION_HISTORY_CAP);
        assert_eq!(history.last().unwrap().id, "149");
    }
}
