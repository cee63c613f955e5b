use std::path::Path;
use std::sync::Arc;

use agentbridge_channels::IntegrationManager;
use agentbridge_core::config::AgentBridgeConfig;
use agentbridge_core::types::Platform;
use agentbridge_decision::{DecisionClient, PayloadDumper};
use agentbridge_farcaster::FarcasterIntegration;
use agentbridge_history::HistoryRecorder;
use agentbridge_matrix::MatrixIntegration;
use agentbridge_nodes::NodeManager;
use agentbridge_orchestrator::Orchestrator;
use agentbridge_ratelimit::RateLimiter;
use agentbridge_tools::default_registry;
use agentbridge_world::WorldState;
use anyhow::Context;

/// Every long-lived handle the orchestrator and the CLI's `run` subcommand
/// need, built exactly once (spec §13 "module-level singletons become
/// explicit dependencies").
pub struct Components {
    pub world: Arc<WorldState>,
    pub nodes: Arc<NodeManager>,
    pub rate_limiter: Arc<RateLimiter>,
    pub integrations: Arc<IntegrationManager>,
    pub history: Arc<HistoryRecorder>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Opens the SQLite-backed history store, creating its parent directory if
/// missing (the default path lives under `~/.agentbridge/`, which may not
/// exist yet on a first run).
pub fn open_history(config: &AgentBridgeConfig) -> anyhow::Result<HistoryRecorder> {
    let path = &config.database.path;
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }
    let conn = rusqlite::Connection::open(path)
        .with_context(|| format!("opening database {path}"))?;
    Ok(HistoryRecorder::new(conn)?)
}

fn build_integrations(config: &AgentBridgeConfig) -> IntegrationManager {
    let mut manager = IntegrationManager::new();
    if let Some(matrix) = &config.channels.matrix {
        manager.register(Box::new(MatrixIntegration::new(
            matrix.homeserver_url.clone(),
            matrix.access_token.clone(),
            matrix.user_id.clone(),
            Vec::new(),
        )));
    }
    if let Some(farcaster) = &config.channels.farcaster {
        manager.register(Box::new(FarcasterIntegration::new(
            farcaster.hub_url.clone(),
            farcaster.api_key.clone(),
            farcaster.signer_uuid.clone(),
            farcaster.fid,
            Vec::new(),
        )));
    }
    manager
}

fn configured_platforms(config: &AgentBridgeConfig) -> Vec<Platform> {
    let mut platforms = Vec::new();
    if config.channels.matrix.is_some() {
        platforms.push(Platform::FederatedChat);
    }
    if config.channels.farcaster.is_some() {
        platforms.push(Platform::SocialNetwork);
    }
    platforms
}

fn bot_identifiers(config: &AgentBridgeConfig) -> Vec<(Platform, String)> {
    let mut ids = Vec::new();
    if let Some(matrix) = &config.channels.matrix {
        ids.push((Platform::FederatedChat, matrix.user_id.clone()));
    }
    if let Some(farcaster) = &config.channels.farcaster {
        ids.push((Platform::SocialNetwork, farcaster.fid.to_string()));
    }
    ids
}

fn decision_client(http: reqwest::Client, config: &AgentBridgeConfig, model: Option<String>, dumper: Option<PayloadDumper>) -> DecisionClient {
    let mut llm = config.llm.clone();
    if let Some(model) = model {
        llm.ai_model = model;
    }
    DecisionClient::new(http, llm, dumper)
}

/// Builds the full dependency graph the orchestrator needs to run cycles
/// (spec §13). Used by the `run` subcommand; cheaper subcommands build
/// only what they need via [`open_history`] directly.
pub fn build(config: &AgentBridgeConfig) -> anyhow::Result<Components> {
    let world = Arc::new(WorldState::new());
    let nodes = Arc::new(NodeManager::new(config.nodes.max_expanded_nodes, &config.nodes.default_pinned_nodes));
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limits.clone(),
        config.cycle.max_cycles_per_hour,
        config.cycle.min_cycle_interval,
    ));
    let integrations = Arc::new(build_integrations(config));
    let history = Arc::new(open_history(config)?);
    let tools = Arc::new(default_registry());

    let http = reqwest::Client::new();
    let dumper = config.debug.ai_dump_payloads_to_file.then(|| {
        PayloadDumper::new(config.debug.ai_payload_dump_directory.clone(), config.debug.ai_payload_dump_max_files)
    });

    let decision = decision_client(http.clone(), config, None, dumper);
    let fallback_decision = config
        .llm
        .fallback_model
        .clone()
        .map(|model| decision_client(http.clone(), config, Some(model), None));
    let summary_decision = decision_client(http, config, Some(config.llm.ai_summary_model.clone()), None);

    let orchestrator = Arc::new(Orchestrator::new(
        world.clone(),
        nodes.clone(),
        rate_limiter.clone(),
        integrations.clone(),
        history.clone(),
        tools,
        decision,
        fallback_decision,
        summary_decision,
        config.nodes.clone(),
        config.retention.clone(),
        config.cycle.clone(),
        configured_platforms(config),
        bot_identifiers(config),
    ));

    Ok(Components {
        world,
        nodes,
        rate_limiter,
        integrations,
        history,
        orchestrator,
    })
}
