use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentbridge_channels::{ChannelStatus, IntegrationManager};
use agentbridge_core::config::{CycleConfig, NodeConfig, RetentionConfig};
use agentbridge_core::types::{now_secs, CycleId, Platform};
use agentbridge_decision::{prompt::build_system_prompt, ActionPlan, DecisionClient, DecisionError, DecisionResult, ToolSpec};
use agentbridge_history::HistoryRecorder;
use agentbridge_nodes::NodeManager;
use agentbridge_payload::{build_node_based, build_traditional, known_node_paths, resolve_node_data, BuildCtx};
use agentbridge_ratelimit::RateLimiter;
use agentbridge_tools::{dispatch_actions, ActionContext, SelectedAction, ToolDefinition, ToolRegistry};
use agentbridge_world::WorldState;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{CycleOutcome, FocusState, PayloadMode};

/// Node-control tools occupy their own payload/tool-catalog group so the
/// exploration phase can offer only them (spec §4.8 Phase A).
const NODE_CONTROL_GROUP: &str = "node-control";

/// Independent size ceiling for node-based payloads; unlike the
/// traditional-mode budget this one isn't what triggers the mode switch,
/// it's just where `reduce_node_based` starts shedding content (spec
/// §4.4.2).
const NODE_BASED_HARD_BUDGET_BYTES: usize = 1_048_576;

const EXPLORATION_INSTRUCTION: &str = "EXPLORATION PHASE: use node tools (expand_node, \
collapse_node, pin_node, unpin_node) to explore the world state and gather the \
information you need. Signal completion by including \"EXPLORATION_COMPLETE\" in your \
reasoning when ready for actions.";

const ACTION_PHASE_INSTRUCTION: &str = "ACTION PHASE: based on your exploration, now take \
concrete actions. Focus on action tools (send_chat_message, send_social_post, \
generate_image, etc.) rather than node tools.";

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize one node of an AI agent's world state for \
inclusion in a collapsed view. Respond with the required JSON object: put a one- or \
two-sentence summary of the data in \"observations\", and leave \"reasoning\" and \
\"selected_actions\" empty.";

/// The cycle engine (spec §4.8 "C8"). Holds every dependency the cycle
/// body needs and owns no domain state itself beyond focus-channel
/// bookkeeping — everything durable lives in C1 (`WorldState`) and C2
/// (`HistoryRecorder`).
pub struct Orchestrator {
    world: Arc<WorldState>,
    nodes: Arc<NodeManager>,
    rate_limiter: Arc<RateLimiter>,
    integrations: Arc<IntegrationManager>,
    history: Arc<HistoryRecorder>,
    tools: Arc<ToolRegistry>,
    decision: DecisionClient,
    fallback_decision: Option<DecisionClient>,
    summary_decision: DecisionClient,
    node_config: NodeConfig,
    retention: RetentionConfig,
    cycle_config: CycleConfig,
    configured_platforms: Vec<Platform>,
    bot_identifiers: Vec<(Platform, String)>,
    focus: Mutex<FocusState>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        world: Arc<WorldState>,
        nodes: Arc<NodeManager>,
        rate_limiter: Arc<RateLimiter>,
        integrations: Arc<IntegrationManager>,
        history: Arc<HistoryRecorder>,
        tools: Arc<ToolRegistry>,
        decision: DecisionClient,
        fallback_decision: Option<DecisionClient>,
        summary_decision: DecisionClient,
        node_config: NodeConfig,
        retention: RetentionConfig,
        cycle_config: CycleConfig,
        configured_platforms: Vec<Platform>,
        bot_identifiers: Vec<(Platform, String)>,
    ) -> Self {
        Self {
            world,
            nodes,
            rate_limiter,
            integrations,
            history,
            tools,
            decision,
            fallback_decision,
            summary_decision,
            node_config,
            retention,
            cycle_config,
            configured_platforms,
            bot_identifiers,
            focus: Mutex::new(FocusState::default()),
        }
    }

    /// Runs cycles back to back until `shutdown` broadcasts `true`,
    /// sleeping `min_cycle_interval * adaptive_multiplier` seconds between
    /// them (spec §4.8 step 9). Grounded on
    /// `skynet-scheduler::engine::SchedulerEngine::run`'s `tokio::select!`
    /// shutdown idiom, replacing its 1-second job-table poll with a single
    /// repeating cycle.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("orchestrator cycle loop started");
        loop {
            let outcome = tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("orchestrator shutting down");
                        return;
                    }
                    continue;
                }
                outcome = self.process_cycle() => outcome,
            };
            info!(
                cycle_id = %outcome.cycle_id,
                mode = outcome.mode.as_str(),
                actions_dispatched = outcome.actions_dispatched,
                actions_succeeded = outcome.actions_succeeded,
                "cycle complete"
            );

            let status = self.rate_limiter.get_status(now_secs());
            let sleep_secs = (self.cycle_config.min_cycle_interval * status.adaptive_multiplier).max(0.1);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs_f64(sleep_secs)) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("orchestrator shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Runs exactly one decision cycle (spec §4.8). Never returns an
    /// error: every failure path degrades to an empty decision and the
    /// cycle still completes, recording what happened.
    pub async fn process_cycle(&self) -> CycleOutcome {
        let focus_channel_id = self.select_focus_channel();
        self.wait_for_rate_limit_clearance().await;

        let now = now_secs();
        self.rate_limiter.record_cycle(now);

        let cycle_id = CycleId::new();
        let connection_states = self.connection_states().await;
        let mode = self.choose_mode();

        let mut ctx = BuildCtx {
            cycle_id: cycle_id.clone(),
            focus_channel_id: focus_channel_id.clone(),
            now,
            retention: self.retention.clone(),
            nodes: self.node_config.clone(),
            bot_identifiers: self.bot_identifiers.clone(),
            connection_states,
        };

        let (decision, used_fallback, exploration_rounds) = match mode {
            PayloadMode::Traditional => {
                let payload = build_traditional(
                    &self.world,
                    &self.rate_limiter,
                    self.node_config.max_traditional_payload_size,
                    &ctx,
                );
                let user_message = serde_json::to_string(&payload).unwrap_or_default();
                let tools = tool_specs(&self.tools.definitions());
                let system_prompt = build_system_prompt(&self.configured_platforms, &self.tools.definitions());
                let (decision, used_fallback) = self
                    .decide_with_fallback(&system_prompt, &user_message, &tools, cycle_id.clone())
                    .await;
                (decision, used_fallback, 0)
            }
            PayloadMode::NodeBased => {
                self.refresh_changed_summaries(now).await;
                self.run_node_based_cycle(&mut ctx, cycle_id.clone()).await
            }
        };

        let selected: Vec<SelectedAction> = decision.selected_actions.iter().map(to_selected_action).collect();
        let action_ctx = self.action_context(focus_channel_id.clone());
        let outcomes = dispatch_actions(&selected, &self.tools, &action_ctx).await;

        self.record_observation(&cycle_id, mode, &decision, focus_channel_id.as_deref(), now);

        let actions_succeeded = outcomes.iter().filter(|o| o.success).count();
        CycleOutcome {
            cycle_id: cycle_id.to_string(),
            focus_channel_id,
            mode,
            exploration_rounds,
            used_fallback_model: used_fallback,
            actions_dispatched: outcomes.len(),
            actions_succeeded,
        }
    }

    /// Phase A (exploration, up to `max_exploration_rounds`) followed by
    /// Phase B (action), only when `enable_two_phase_ai_process` is set;
    /// otherwise a single full-tool-access call (spec §4.8 Phase A/B,
    /// grounded on `json_observer_orchestrator.py`'s
    /// `_process_two_phase_cycle` / `_process_single_phase_cycle`).
    async fn run_node_based_cycle(&self, ctx: &mut BuildCtx, cycle_id: CycleId) -> (DecisionResult, bool, u32) {
        if !self.node_config.enable_two_phase_ai_process {
            let payload = build_node_based(
                &self.world,
                &self.nodes,
                &self.rate_limiter,
                NODE_BASED_HARD_BUDGET_BYTES,
                ctx,
            );
            let user_message = serde_json::to_string(&payload).unwrap_or_default();
            let tools = tool_specs(&self.tools.definitions());
            let system_prompt = build_system_prompt(&self.configured_platforms, &self.tools.definitions());
            let (decision, used_fallback) = self
                .decide_with_fallback(&system_prompt, &user_message, &tools, cycle_id)
                .await;
            return (decision, used_fallback, 0);
        }

        let node_tool_defs = self.tools.definitions_in_groups(&[NODE_CONTROL_GROUP]);
        let node_tools = tool_specs(&node_tool_defs);
        let exploration_system_prompt = build_system_prompt(&self.configured_platforms, &node_tool_defs);
        let action_ctx = self.action_context(ctx.focus_channel_id.clone());

        let mut rounds_run = 0u32;
        let mut any_fallback = false;

        for round in 0..self.node_config.max_exploration_rounds {
            rounds_run = round + 1;
            ctx.now = now_secs();
            let payload = build_node_based(
                &self.world,
                &self.nodes,
                &self.rate_limiter,
                NODE_BASED_HARD_BUDGET_BYTES,
                ctx,
            );
            let user_message = annotate_phase(&payload, "exploration", round + 1, self.node_config.max_exploration_rounds, EXPLORATION_INSTRUCTION);

            let explore_cycle_id = CycleId::new();
            let (decision, used_fallback) = self
                .decide_with_fallback(&exploration_system_prompt, &user_message, &node_tools, explore_cycle_id)
                .await;
            any_fallback = any_fallback || used_fallback;

            let node_actions: Vec<SelectedAction> = decision
                .selected_actions
                .iter()
                .filter(|a| node_tool_defs.iter().any(|d| d.name == a.action_type))
                .map(to_selected_action)
                .collect();

            if node_actions.is_empty() {
                info!(round = round + 1, "no node actions taken, ending exploration");
                break;
            }
            dispatch_actions(&node_actions, &self.tools, &action_ctx).await;

            if decision.reasoning.contains("EXPLORATION_COMPLETE") {
                info!(round = round + 1, "model signaled exploration complete");
                break;
            }

            if round + 1 < self.node_config.max_exploration_rounds {
                self.refresh_changed_summaries(now_secs()).await;
            }
        }

        ctx.now = now_secs();
        self.refresh_changed_summaries(ctx.now).await;
        let action_payload = build_node_based(
            &self.world,
            &self.nodes,
            &self.rate_limiter,
            NODE_BASED_HARD_BUDGET_BYTES,
            ctx,
        );
        let user_message = annotate_phase(&action_payload, "action", rounds_run, self.node_config.max_exploration_rounds, ACTION_PHASE_INSTRUCTION);

        let action_tool_defs: Vec<ToolDefinition> = self
            .tools
            .definitions()
            .into_iter()
            .filter(|d| d.group != NODE_CONTROL_GROUP)
            .collect();
        let action_tools = tool_specs(&action_tool_defs);
        let action_system_prompt = build_system_prompt(&self.configured_platforms, &action_tool_defs);

        let (decision, used_fallback) = self
            .decide_with_fallback(&action_system_prompt, &user_message, &action_tools, cycle_id)
            .await;
        any_fallback = any_fallback || used_fallback;

        (decision, any_fallback, rounds_run)
    }

    /// Calls the primary decision client, falling back to a secondary
    /// client built from `LlmConfig::fallback_model` when the primary
    /// reports HTTP 402 quota exhaustion (spec §4.7/§4.8). Every other
    /// failure path already degrades to an empty `DecisionResult` inside
    /// `DecisionClient::decide` itself.
    async fn decide_with_fallback(
        &self,
        system_prompt: &str,
        user_message: &str,
        tools: &[ToolSpec],
        cycle_id: CycleId,
    ) -> (DecisionResult, bool) {
        match self.decision.decide(system_prompt, user_message, tools, cycle_id.clone()).await {
            Ok(result) => (result, false),
            Err(DecisionError::QuotaExceeded { body }) => {
                warn!(cycle_id = %cycle_id, "primary model quota exceeded, switching to fallback model");
                match &self.fallback_decision {
                    Some(fallback) => match fallback.decide(system_prompt, user_message, tools, cycle_id.clone()).await {
                        Ok(result) => (result, true),
                        Err(e) => {
                            warn!(cycle_id = %cycle_id, error = %e, "fallback model request also failed");
                            (
                                DecisionResult::empty(cycle_id, "fallback model request failed", e.to_string()),
                                true,
                            )
                        }
                    },
                    None => (
                        DecisionResult::empty(cycle_id, "quota exceeded and no fallback model configured", body),
                        false,
                    ),
                }
            }
            Err(DecisionError::Request(e)) => {
                warn!(cycle_id = %cycle_id, error = %e, "decision request failed");
                (
                    DecisionResult::empty(cycle_id, "decision request failed", e.to_string()),
                    false,
                )
            }
        }
    }

    /// Blocks (in bounded, logged steps) until C5 allows the next cycle to
    /// proceed (spec §4.8 step 2). A bound on retries keeps a
    /// misconfigured or perpetually-cooling-down limiter from wedging the
    /// loop forever; after the cap the cycle runs anyway rather than
    /// starving indefinitely.
    async fn wait_for_rate_limit_clearance(&self) {
        const MAX_WAITS: u32 = 20;
        for attempt in 0..MAX_WAITS {
            let now = now_secs();
            let (allowed, wait_seconds) = self.rate_limiter.can_process_cycle(now);
            if allowed {
                return;
            }
            info!(attempt, wait_seconds, "cycle rate-limited, waiting");
            tokio::time::sleep(Duration::from_secs_f64(wait_seconds.max(0.1))).await;
        }
        warn!("exceeded rate-limit wait retries, proceeding with cycle anyway");
    }

    /// Picks the next focus channel: the most recently active channel if
    /// it has newer activity than the last cycle observed, else a stable
    /// round-robin over all known channels (spec §4.8 step 1).
    fn select_focus_channel(&self) -> Option<String> {
        let mut channels = self.world.all_channels();
        if channels.is_empty() {
            return None;
        }
        channels.sort_by(|a, b| a.id.cmp(&b.id));

        let mut focus = self.focus.lock().unwrap();
        let most_recent = channels
            .iter()
            .max_by(|a, b| a.last_activity_ts.total_cmp(&b.last_activity_ts));
        if let Some(channel) = most_recent {
            if channel.last_activity_ts > focus.last_seen_activity_ts {
                focus.last_seen_activity_ts = channel.last_activity_ts;
                return Some(channel.id.clone());
            }
        }

        let idx = focus.round_robin_cursor % channels.len();
        focus.round_robin_cursor = focus.round_robin_cursor.wrapping_add(1);
        Some(channels[idx].id.clone())
    }

    async fn connection_states(&self) -> HashMap<String, String> {
        self.integrations
            .statuses()
            .await
            .into_iter()
            .map(|(name, status)| (name, connection_state_label(&status)))
            .collect()
    }

    fn choose_mode(&self) -> PayloadMode {
        let channels = self.world.all_channels();
        let message_count: usize = channels.iter().map(|c| c.recent_messages.len()).sum();
        let estimate = agentbridge_payload::estimate_traditional_size(
            channels.len(),
            message_count,
            self.retention.ai_action_history_length,
        );
        if estimate > self.node_config.max_traditional_payload_size {
            info!(estimate, "switching to node-based processing");
            PayloadMode::NodeBased
        } else {
            PayloadMode::Traditional
        }
    }

    /// Refreshes the AI summary of every collapsed node whose underlying
    /// data changed since its last summary (spec §4.8 step 4, grounded on
    /// `json_observer_orchestrator.py::process_decision_cycle`'s
    /// `update_summaries_for_changed_nodes` step — the summary-service
    /// class itself isn't present in the retrieval pack, so the summary
    /// call is implemented by reusing `DecisionClient` with
    /// `ai_summary_model` and reading its `observations` field).
    async fn refresh_changed_summaries(&self, now: f64) {
        for path in known_node_paths(&self.world) {
            let data = resolve_node_data(&path, &self.world, &self.rate_limiter, now);
            if self.nodes.is_data_changed(&path, &data) {
                let summary = self.summarize_node(&path, &data).await;
                self.nodes.update_summary(&path, &summary, &data);
            }
        }
    }

    async fn summarize_node(&self, path: &str, data: &Value) -> String {
        let user_message = format!(
            "Node path: {path}\nData:\n{}",
            serde_json::to_string(data).unwrap_or_default()
        );
        match self
            .summary_decision
            .decide(SUMMARY_SYSTEM_PROMPT, &user_message, &[], CycleId::new())
            .await
        {
            Ok(result) if !result.observations.is_empty() => result.observations,
            Ok(result) if !result.reasoning.is_empty() => result.reasoning,
            Ok(_) => "No summary available.".to_string(),
            Err(e) => {
                warn!(path, error = %e, "node summary request failed");
                "Summary unavailable due to an error.".to_string()
            }
        }
    }

    fn action_context(&self, focus_channel: Option<String>) -> ActionContext {
        ActionContext {
            world: self.world.clone(),
            nodes: self.nodes.clone(),
            rate_limiter: self.rate_limiter.clone(),
            integrations: self.integrations.clone(),
            history: self.history.clone(),
            focus_channel,
            http: reqwest::Client::new(),
            image_gen_endpoint: None,
            image_describe_endpoint: None,
        }
    }

    fn record_observation(
        &self,
        cycle_id: &CycleId,
        mode: PayloadMode,
        decision: &DecisionResult,
        focus_channel_id: Option<&str>,
        now: f64,
    ) {
        let data = json!({
            "cycle_id": cycle_id.to_string(),
            "mode": mode.as_str(),
            "reasoning": decision.reasoning,
            "observations": decision.observations,
            "selected_action_count": decision.selected_actions.len(),
        });
        if let Err(e) = self.history.record_state_change("llm_observation", &data, focus_channel_id, None, None, now) {
            warn!(error = %e, "failed to persist cycle observation");
        }
    }

    /// Exports recorded history as training data (spec §4.2 C2, exposed
    /// for the `export-training` CLI subcommand).
    pub fn export_training(
        &self,
        start_ts: Option<f64>,
        end_ts: Option<f64>,
        output_file: Option<&str>,
        jsonl: bool,
    ) -> Result<agentbridge_history::TrainingExport> {
        Ok(self.history.export_for_training(start_ts, end_ts, output_file, jsonl)?)
    }

    /// Deletes history older than `days_to_keep` (spec §4.2, exposed for
    /// the `cleanup` CLI subcommand). Best-effort, matching
    /// `HistoryRecorder::cleanup_old_records`'s "never blocks the core
    /// cycle" contract.
    pub fn cleanup(&self, days_to_keep: u32) {
        self.history.cleanup_old_records(days_to_keep);
    }
}

fn connection_state_label(status: &ChannelStatus) -> String {
    match status {
        ChannelStatus::Connected => "connected".to_string(),
        ChannelStatus::Connecting => "connecting".to_string(),
        ChannelStatus::Disconnected => "disconnected".to_string(),
        ChannelStatus::Error(reason) => format!("error: {reason}"),
    }
}

fn tool_specs(defs: &[ToolDefinition]) -> Vec<ToolSpec> {
    defs.iter()
        .map(|d| ToolSpec {
            name: d.name.clone(),
            description: d.description.clone(),
            input_schema: d.parameter_schema.clone(),
        })
        .collect()
}

fn to_selected_action(plan: &ActionPlan) -> SelectedAction {
    SelectedAction {
        action_type: plan.action_type.clone(),
        parameters: plan.parameters.clone(),
        reasoning: plan.reasoning.clone(),
        priority: plan.priority,
    }
}

fn annotate_phase(payload: &impl serde::Serialize, phase: &str, round: u32, max_rounds: u32, instruction: &str) -> String {
    let mut value = serde_json::to_value(payload).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("phase".to_string(), json!(phase));
        map.insert("round".to_string(), json!(round));
        map.insert("max_rounds".to_string(), json!(max_rounds));
        map.insert("instruction".to_string(), json!(instruction));
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_label_formats_error_variant() {
        assert_eq!(connection_state_label(&ChannelStatus::Connected), "connected");
        assert_eq!(
            connection_state_label(&ChannelStatus::Error("timeout".to_string())),
            "error: timeout"
        );
    }

    #[test]
    fn to_selected_action_copies_every_field() {
        let plan = ActionPlan {
            action_type: "wait".to_string(),
            parameters: json!({"seconds": 5}),
            reasoning: "nothing to do".to_string(),
            priority: 2,
        };
        let selected = to_selected_action(&plan);
        assert_eq!(selected.action_type, "wait");
        assert_eq!(selected.priority, 2);
        assert_eq!(selected.parameters, json!({"seconds": 5}));
    }

    #[test]
    fn annotate_phase_injects_expected_keys() {
        let payload = json!({"current_channel_id": "room1"});
        let annotated = annotate_phase(&payload, "exploration", 1, 3, "go explore");
        let parsed: Value = serde_json::from_str(&annotated).unwrap();
        assert_eq!(parsed["phase"], "exploration");
        assert_eq!(parsed["round"], 1);
        assert_eq!(parsed["max_rounds"], 3);
        assert_eq!(parsed["current_channel_id"], "room1");
    }

    fn build_test_orchestrator(node_config: NodeConfig) -> Orchestrator {
        let world = Arc::new(WorldState::new());
        let nodes = Arc::new(NodeManager::new(10, &[]));
        let cycle_config = CycleConfig::default();
        let rate_limiter = Arc::new(RateLimiter::new(
            agentbridge_core::config::RateLimitConfig::default(),
            cycle_config.max_cycles_per_hour,
            cycle_config.min_cycle_interval,
        ));
        let integrations = Arc::new(IntegrationManager::new());
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let history = Arc::new(HistoryRecorder::new(conn).unwrap());
        let tools = Arc::new(agentbridge_tools::default_registry());
        let llm = agentbridge_core::config::LlmConfig::default();
        let http = reqwest::Client::new();
        let decision = DecisionClient::new(http.clone(), llm.clone(), None);
        let summary_decision = DecisionClient::new(http, llm, None);
        Orchestrator::new(
            world,
            nodes,
            rate_limiter,
            integrations,
            history,
            tools,
            decision,
            None,
            summary_decision,
            node_config,
            RetentionConfig::default(),
            cycle_config,
            vec![Platform::FederatedChat],
            vec![],
        )
    }

    fn make_channel(id: &str, last_activity_ts: f64) -> agentbridge_world::types::Channel {
        let mut channel = agentbridge_world::types::Channel::new(id, Platform::FederatedChat, id);
        channel.last_activity_ts = last_activity_ts;
        channel
    }

    #[test]
    fn select_focus_channel_prefers_newer_activity_over_round_robin() {
        let orch = build_test_orchestrator(NodeConfig::default());
        orch.world.upsert_channel(make_channel("stale", 10.0));
        orch.world.upsert_channel(make_channel("fresh", 500.0));

        assert_eq!(orch.select_focus_channel(), Some("fresh".to_string()));
    }

    #[test]
    fn select_focus_channel_round_robins_once_activity_is_stale() {
        let orch = build_test_orchestrator(NodeConfig::default());
        orch.world.upsert_channel(make_channel("a", 100.0));
        orch.world.upsert_channel(make_channel("b", 100.0));

        // First call always takes the most-recently-active branch (equal
        // timestamps, so either channel may win the tie); once
        // `last_seen_activity_ts` catches up to the shared 100.0, every
        // further call falls through to the stable, sorted-id round-robin.
        let _first = orch.select_focus_channel();
        let second = orch.select_focus_channel();
        let third = orch.select_focus_channel();
        let fourth = orch.select_focus_channel();

        assert_eq!(second, Some("a".to_string()));
        assert_eq!(third, Some("b".to_string()));
        assert_eq!(fourth, Some("a".to_string()));
    }

    #[test]
    fn select_focus_channel_is_none_with_no_known_channels() {
        let orch = build_test_orchestrator(NodeConfig::default());
        assert_eq!(orch.select_focus_channel(), None);
    }

    #[test]
    fn choose_mode_stays_traditional_under_the_size_budget() {
        let orch = build_test_orchestrator(NodeConfig::default());
        assert_eq!(orch.choose_mode(), PayloadMode::Traditional);
    }

    #[test]
    fn choose_mode_switches_to_node_based_once_estimate_exceeds_budget() {
        let mut node_config = NodeConfig::default();
        node_config.max_traditional_payload_size = 1;
        let orch = build_test_orchestrator(node_config);
        orch.world.upsert_channel(make_channel("room", 1.0));

        assert_eq!(orch.choose_mode(), PayloadMode::NodeBased);
    }
}
