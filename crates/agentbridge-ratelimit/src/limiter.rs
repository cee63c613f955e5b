use crate::status::{LimitUsage, RateLimitStatus};
use agentbridge_core::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const HOUR_SECS: f64 = 3600.0;
const ADAPTIVE_DECAY: f64 = 0.9;

struct Inner {
    cycle_timestamps: VecDeque<f64>,
    action_timestamps: HashMap<String, VecDeque<f64>>,
    channel_timestamps: HashMap<String, VecDeque<f64>>,
    adaptive_multiplier: f64,
    burst_detected: bool,
    cooldown_until: Option<f64>,
}

/// Multi-dimensional rate limiter: cycle cadence, per-action-kind caps,
/// per-channel messaging caps, and adaptive burst cooldown (spec §4.5 / C5).
/// Mutated only by the Orchestrator task; reads return immutable snapshots.
pub struct RateLimiter {
    config: RateLimitConfig,
    max_cycles_per_hour: u32,
    min_cycle_interval: f64,
    inner: Mutex<Inner>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, max_cycles_per_hour: u32, min_cycle_interval: f64) -> Self {
        Self {
            config,
            max_cycles_per_hour,
            min_cycle_interval,
            inner: Mutex::new(Inner {
                cycle_timestamps: VecDeque::new(),
                action_timestamps: HashMap::new(),
                channel_timestamps: HashMap::new(),
                adaptive_multiplier: 1.0,
                burst_detected: false,
                cooldown_until: None,
            }),
        }
    }

    fn purge(window: &mut VecDeque<f64>, now: f64, horizon: f64) {
        while window.front().is_some_and(|ts| now - ts > horizon) {
            window.pop_front();
        }
    }

    /// `(can_process, wait_seconds)`. Checks the hourly cycle cap, the
    /// adaptive minimum inter-cycle interval, active cooldown, and burst
    /// detection (>`max_burst_cycles` cycles within `burst_window_seconds`).
    pub fn can_process_cycle(&self, now: f64) -> (bool, f64) {
        let mut inner = self.inner.lock().unwrap();
        Self::purge(&mut inner.cycle_timestamps, now, HOUR_SECS);

        if let Some(until) = inner.cooldown_until {
            if now < until {
                return (false, until - now);
            }
        }

        if inner.cycle_timestamps.len() as u32 >= self.max_cycles_per_hour {
            return (false, HOUR_SECS / self.max_cycles_per_hour.max(1) as f64);
        }

        let burst_count = inner
            .cycle_timestamps
            .iter()
            .filter(|ts| now - *ts <= self.config.burst_window_seconds)
            .count() as u32;
        if burst_count >= self.config.max_burst_cycles {
            inner.burst_detected = true;
            inner.adaptive_multiplier =
                (inner.adaptive_multiplier * self.config.cooldown_multiplier).max(1.0);
            let cooldown = self.config.cooldown_multiplier * self.min_cycle_interval;
            inner.cooldown_until = Some(now + cooldown);
            return (false, cooldown);
        }

        if let Some(&last) = inner.cycle_timestamps.back() {
            let required = self.min_cycle_interval * inner.adaptive_multiplier;
            if now - last < required {
                return (false, required - (now - last));
            }
        }

        (true, 0.0)
    }

    /// Records a clean cycle tick. If no burst was detected, the adaptive
    /// multiplier decays geometrically back toward 1.0.
    pub fn record_cycle(&self, now: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.cycle_timestamps.push_back(now);
        if !inner.burst_detected {
            inner.adaptive_multiplier = (inner.adaptive_multiplier * ADAPTIVE_DECAY).max(1.0);
        }
        inner.burst_detected = false;
    }

    pub fn can_execute_action(&self, kind: &str, now: f64) -> (bool, String) {
        let Some(&limit) = self.config.action_limits.get(kind) else {
            return (true, String::new());
        };
        let mut inner = self.inner.lock().unwrap();
        let window = inner.action_timestamps.entry(kind.to_string()).or_default();
        Self::purge(window, now, HOUR_SECS);
        let used = window.len() as u32;
        if used >= limit {
            return (
                false,
                format!("Action rate limit exceeded for {}: {}/{} per hour", kind, used, limit),
            );
        }
        (true, String::new())
    }

    pub fn record_action(&self, kind: &str, now: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .action_timestamps
            .entry(kind.to_string())
            .or_default()
            .push_back(now);
    }

    fn channel_key(platform: &str, channel_id: &str) -> String {
        format!("{platform}:{channel_id}")
    }

    pub fn can_send_to_channel(&self, channel_id: &str, platform: &str, now: f64) -> (bool, String) {
        let Some(&limit) = self.config.channel_limits.get(platform) else {
            return (true, String::new());
        };
        let mut inner = self.inner.lock().unwrap();
        let window = inner
            .channel_timestamps
            .entry(Self::channel_key(platform, channel_id))
            .or_default();
        Self::purge(window, now, HOUR_SECS);
        let used = window.len() as u32;
        if used >= limit {
            return (
                false,
                format!(
                    "Channel rate limit exceeded for {}: {}/{} per hour",
                    channel_id, used, limit
                ),
            );
        }
        (true, String::new())
    }

    pub fn record_channel_message(&self, channel_id: &str, platform: &str, now: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .channel_timestamps
            .entry(Self::channel_key(platform, channel_id))
            .or_default()
            .push_back(now);
    }

    pub fn get_status(&self, now: f64) -> RateLimitStatus {
        let mut inner = self.inner.lock().unwrap();
        Self::purge(&mut inner.cycle_timestamps, now, HOUR_SECS);

        let mut action_limits = HashMap::new();
        for (kind, limit) in &self.config.action_limits {
            let window = inner.action_timestamps.entry(kind.clone()).or_default();
            Self::purge(window, now, HOUR_SECS);
            let used = window.len() as u32;
            action_limits.insert(
                kind.clone(),
                LimitUsage {
                    used,
                    limit: *limit,
                    remaining: limit.saturating_sub(used),
                },
            );
        }

        let mut channel_limits = HashMap::new();
        for (platform, limit) in &self.config.channel_limits {
            let prefix = format!("{platform}:");
            let used: u32 = inner
                .channel_timestamps
                .iter_mut()
                .filter(|(key, _)| key.starts_with(&prefix))
                .map(|(_, window)| {
                    Self::purge(window, now, HOUR_SECS);
                    window.len() as u32
                })
                .sum();
            channel_limits.insert(
                platform.clone(),
                LimitUsage {
                    used,
                    limit: *limit,
                    remaining: limit.saturating_sub(used),
                },
            );
        }

        RateLimitStatus {
            cycles_per_hour: inner.cycle_timestamps.len() as u32,
            max_cycles_per_hour: self.max_cycles_per_hour,
            adaptive_multiplier: inner.adaptive_multiplier,
            cooldown_until: inner.cooldown_until,
            action_limits,
            channel_limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default(), 300, 12.0)
    }

    #[test]
    fn action_rate_limit_blocks_after_cap() {
        let mut config = RateLimitConfig::default();
        config.action_limits.insert("TestTool".to_string(), 2);
        let limiter = RateLimiter::new(config, 300, 12.0);
        let now = 1000.0;

        for i in 0..2 {
            let (ok, _) = limiter.can_execute_action("TestTool", now + i as f64);
            assert!(ok);
            limiter.record_action("TestTool", now + i as f64);
        }
        let (ok, reason) = limiter.can_execute_action("TestTool", now + 2.0);
        assert!(!ok);
        assert!(reason.contains("2/2 per hour"));
    }

    #[test]
    fn channel_rate_limit_blocks_after_cap() {
        let mut config = RateLimitConfig::default();
        config.channel_limits.insert("test_type".to_string(), 2);
        let limiter = RateLimiter::new(config, 300, 12.0);
        let now = 1000.0;

        for i in 0..2 {
            let (ok, _) = limiter.can_send_to_channel("room", "test_type", now + i as f64);
            assert!(ok);
            limiter.record_channel_message("room", "test_type", now + i as f64);
        }
        let (ok, reason) = limiter.can_send_to_channel("room", "test_type", now + 2.0);
        assert!(!ok);
        assert!(reason.contains("Channel rate limit exceeded"));
    }

    #[test]
    fn get_status_reports_real_channel_usage() {
        let mut config = RateLimitConfig::default();
        config.channel_limits.insert("test_type".to_string(), 5);
        let limiter = RateLimiter::new(config, 300, 12.0);
        let now = 1000.0;

        limiter.record_channel_message("room-a", "test_type", now);
        limiter.record_channel_message("room-b", "test_type", now);

        let status = limiter.get_status(now + 1.0);
        let usage = status.channel_limits.get("test_type").unwrap();
        assert_eq!(usage.used, 2);
        assert_eq!(usage.remaining, 3);
    }

    #[test]
    fn burst_triggers_cooldown() {
        let mut config = RateLimitConfig::default();
        config.max_burst_cycles = 3;
        config.burst_window_seconds = 60.0;
        let limiter = RateLimiter::new(config, 300, 0.0);
        let now = 1000.0;

        for i in 0..3 {
            let (ok, _) = limiter.can_process_cycle(now + i as f64);
            assert!(ok);
            limiter.record_cycle(now + i as f64);
        }
        let (ok, wait) = limiter.can_process_cycle(now + 3.0);
        assert!(!ok);
        assert!(wait > 0.0);
    }

    #[test]
    fn monotonicity_stays_blocked_within_window() {
        let mut config = RateLimitConfig::default();
        config.action_limits.insert("Tool".to_string(), 1);
        let limiter = RateLimiter::new(config, 300, 12.0);
        limiter.record_action("Tool", 0.0);
        let (ok1, _) = limiter.can_execute_action("Tool", 10.0);
        let (ok2, _) = limiter.can_execute_action("Tool", 100.0);
        assert!(!ok1);
        assert!(!ok2);
    }
}
