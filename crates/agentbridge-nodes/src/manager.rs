use crate::fingerprint::fingerprint;
use crate::types::{ExpansionStatus, NodeMetadata, SystemEvent};
use agentbridge_core::types::now_secs;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const SYSTEM_EVENTS_CAP: usize = 50;

struct Inner {
    nodes: HashMap<String, NodeMetadata>,
    max_expanded: usize,
    events: VecDeque<SystemEvent>,
}

/// Tracks which subtrees of the world state are expanded vs. collapsed for
/// LLM context, with LRU eviction over unpinned expanded nodes, pinning, and
/// change detection (spec §4.3 / C3).
pub struct NodeManager {
    inner: Mutex<Inner>,
}

impl NodeManager {
    pub fn new(max_expanded: usize, default_pinned: &[String]) -> Self {
        let mut nodes = HashMap::new();
        for path in default_pinned {
            let mut meta = NodeMetadata::new(path.clone());
            meta.is_pinned = true;
            nodes.insert(path.clone(), meta);
        }
        Self {
            inner: Mutex::new(Inner {
                nodes,
                max_expanded,
                events: VecDeque::new(),
            }),
        }
    }

    fn entry<'a>(inner: &'a mut Inner, path: &str) -> &'a mut NodeMetadata {
        inner
            .nodes
            .entry(path.to_string())
            .or_insert_with(|| NodeMetadata::new(path))
    }

    fn push_event(inner: &mut Inner, kind: &str, node_path: &str, detail: &str) {
        inner.events.push_back(SystemEvent {
            timestamp: now_secs(),
            kind: kind.to_string(),
            node_path: node_path.to_string(),
            detail: detail.to_string(),
        });
        while inner.events.len() > SYSTEM_EVENTS_CAP {
            inner.events.pop_front();
        }
    }

    /// Marks `path` expanded. If doing so would push the total number of
    /// expanded nodes (pinned and unpinned alike) past `max_expanded`,
    /// auto-collapses the least-recently-expanded *unpinned* expanded node
    /// first and emits a `system_event`. A node that is pinned but currently
    /// collapsed consumes no budget.
    pub fn expand(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        if Self::entry(&mut inner, path).is_expanded {
            return;
        }

        let pinned_expanded_count = inner
            .nodes
            .values()
            .filter(|n| n.is_expanded && n.is_pinned)
            .count();
        let expanded_unpinned_count = inner
            .nodes
            .values()
            .filter(|n| n.is_expanded && !n.is_pinned)
            .count();
        let budget = inner.max_expanded.saturating_sub(pinned_expanded_count);

        if expanded_unpinned_count >= budget {
            let victim = inner
                .nodes
                .values()
                .filter(|n| n.is_expanded && !n.is_pinned)
                .min_by(|a, b| {
                    a.last_expanded_ts
                        .partial_cmp(&b.last_expanded_ts)
                        .unwrap()
                        .then(a.node_path.cmp(&b.node_path))
                })
                .map(|n| n.node_path.clone());
            if let Some(victim_path) = victim {
                if let Some(v) = inner.nodes.get_mut(&victim_path) {
                    v.is_expanded = false;
                }
                Self::push_event(
                    &mut inner,
                    "auto_collapse",
                    &victim_path,
                    &format!("auto-collapsed to make room for {}", path),
                );
            }
        }

        let now = now_secs();
        let node = Self::entry(&mut inner, path);
        node.is_expanded = true;
        node.last_expanded_ts = now;
    }

    pub fn collapse(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        Self::entry(&mut inner, path).is_expanded = false;
    }

    pub fn pin(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        Self::entry(&mut inner, path).is_pinned = true;
    }

    pub fn unpin(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        Self::entry(&mut inner, path).is_pinned = false;
    }

    /// Marks a node's summary stale; the next payload build will re-summarize.
    pub fn refresh_summary(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        Self::entry(&mut inner, path).last_summary_ts = 0.0;
    }

    /// Compares a stable hash of `current_data` against the last stored
    /// fingerprint; does not mutate state (the caller calls `update_summary`
    /// once it has a fresh one).
    pub fn is_data_changed(&self, path: &str, current_data: &serde_json::Value) -> bool {
        let inner = self.inner.lock().unwrap();
        let current_fp = fingerprint(current_data);
        match inner.nodes.get(path).and_then(|n| n.last_data_fingerprint) {
            Some(fp) => fp != current_fp,
            None => true,
        }
    }

    pub fn update_summary(&self, path: &str, text: &str, current_data: &serde_json::Value) {
        let mut inner = self.inner.lock().unwrap();
        let fp = fingerprint(current_data);
        let now = now_secs();
        let node = Self::entry(&mut inner, path);
        node.ai_summary = text.to_string();
        node.last_summary_ts = now;
        node.last_data_fingerprint = Some(fp);
    }

    pub fn get_expansion_status(&self) -> ExpansionStatus {
        let inner = self.inner.lock().unwrap();
        let mut expanded: Vec<String> = inner
            .nodes
            .values()
            .filter(|n| n.is_expanded)
            .map(|n| n.node_path.clone())
            .collect();
        let mut pinned: Vec<String> = inner
            .nodes
            .values()
            .filter(|n| n.is_pinned)
            .map(|n| n.node_path.clone())
            .collect();
        expanded.sort();
        pinned.sort();
        ExpansionStatus {
            expanded,
            pinned,
            capacity: inner.max_expanded,
        }
    }

    pub fn get_node(&self, path: &str) -> Option<NodeMetadata> {
        self.inner.lock().unwrap().nodes.get(path).cloned()
    }

    pub fn all_nodes(&self) -> Vec<NodeMetadata> {
        self.inner.lock().unwrap().nodes.values().cloned().collect()
    }

    pub fn recent_system_events(&self) -> Vec<SystemEvent> {
        self.inner.lock().unwrap().events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_never_exceeds_capacity() {
        let mgr = NodeManager::new(3, &["system.rate_limits".to_string()]);
        mgr.expand("channels.federated_chat.a");
        mgr.expand("channels.federated_chat.b");
        mgr.expand("channels.federated_chat.c");
        let status = mgr.get_expansion_status();
        let expanded_unpinned = status
            .expanded
            .iter()
            .filter(|p| !status.pinned.contains(p))
            .count();
        assert!(expanded_unpinned + status.pinned.len() <= status.capacity);
    }

    #[test]
    fn auto_collapse_evicts_oldest_unpinned() {
        let mgr = NodeManager::new(2, &[]);
        mgr.expand("a");
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.expand("b");
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.expand("c");

        let events = mgr.recent_system_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].node_path, "a");
        assert!(!mgr.get_node("a").unwrap().is_expanded);
        assert!(mgr.get_node("b").unwrap().is_expanded);
        assert!(mgr.get_node("c").unwrap().is_expanded);
    }

    #[test]
    fn pinned_nodes_are_never_auto_collapsed() {
        let mgr = NodeManager::new(1, &["system.rate_limits".to_string()]);
        mgr.expand("system.rate_limits");
        mgr.expand("channels.a");
        assert!(mgr.get_node("system.rate_limits").unwrap().is_expanded);
    }

    #[test]
    fn a_collapsed_pinned_node_does_not_count_against_the_expanded_budget() {
        let mgr = NodeManager::new(3, &["system.rate_limits".to_string()]);
        mgr.expand("channels.a");
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.expand("channels.b");
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.expand("channels.c");

        assert!(mgr.recent_system_events().is_empty());
        assert!(mgr.get_node("channels.a").unwrap().is_expanded);
        assert!(mgr.get_node("channels.b").unwrap().is_expanded);
        assert!(mgr.get_node("channels.c").unwrap().is_expanded);
        assert!(!mgr.get_node("system.rate_limits").unwrap().is_expanded);

        mgr.expand("channels.d");

        let events = mgr.recent_system_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].node_path, "channels.a");
        assert!(!mgr.get_node("channels.a").unwrap().is_expanded);
        assert!(mgr.get_node("channels.b").unwrap().is_expanded);
        assert!(mgr.get_node("channels.c").unwrap().is_expanded);
        assert!(mgr.get_node("channels.d").unwrap().is_expanded);
        assert!(!mgr.get_node("system.rate_limits").unwrap().is_expanded);
    }
}
