//! Operator entry point: parses the CLI surface (spec §6), loads config,
//! and wires up the composition root before handing off to the
//! orchestrator's cycle loop or to a one-shot maintenance command.
//!
//! Startup sequence (tracing init, fallback-to-defaults config load,
//! `#[tokio::main] async fn main() -> anyhow::Result<()>`) grounded on
//! `skynet-gateway::main`. Subcommand shape grounded on
//! `loom`'s `clap::Parser`/`Subcommand`/`Args` derive pattern.

mod cli;
mod compose;
mod history_writer;
mod ingest;
mod integrations_cmd;

use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use agentbridge_core::config::AgentBridgeConfig;
use cli::{Cli, Command, IntegrationsCommand};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "agentbridge=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(agentbridge_core::config::default_config_path);

    let config = match AgentBridgeConfig::load(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(1);
        }
    };

    let exit_code = match run(cli.command, config, &config_path).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("runtime error: {e:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

async fn run(command: Command, config: AgentBridgeConfig, config_path: &str) -> anyhow::Result<i32> {
    match command {
        Command::Run => run_orchestrator(config).await?,
        Command::ExportTraining { out, since, jsonl } => export_training(&config, since, &out, jsonl)?,
        Command::Cleanup { days } => cleanup(&config, days)?,
        Command::Integrations(args) => match args.action {
            IntegrationsCommand::List => integrations_cmd::list(&config).await?,
            IntegrationsCommand::Test => {
                if !integrations_cmd::test(&config).await? {
                    return Ok(2);
                }
            }
            IntegrationsCommand::Add(add_args) => integrations_cmd::add(config_path, &add_args)?,
            IntegrationsCommand::Remove { platform } => integrations_cmd::remove(config_path, platform)?,
        },
    }
    Ok(0)
}

/// `run`: connects every configured integration, starts the undecryptable-
/// event retry worker and the single ingestion consumer, then drives the
/// orchestrator's cycle loop until Ctrl-C (spec §4.8/§9).
async fn run_orchestrator(config: AgentBridgeConfig) -> anyhow::Result<()> {
    let components = compose::build(&config)?;

    components.integrations.connect_all().await;
    let ingestion_rx = components.integrations.spawn_ingestion();
    let pending_undecryptable = ingest::pending_queue();
    let message_buffer = ingest::message_buffer();
    let history_writer = history_writer::spawn(components.history.clone());

    tokio::spawn(ingest::run_ingestion_consumer(
        ingestion_rx,
        components.world.clone(),
        components.nodes.clone(),
        history_writer.clone(),
        pending_undecryptable.clone(),
        message_buffer.clone(),
    ));
    tokio::spawn(ingest::run_undecryptable_retry_worker(
        components.world.clone(),
        components.integrations.clone(),
        pending_undecryptable,
        300,
    ));
    tokio::spawn(ingest::run_message_batch_worker(
        message_buffer,
        components.world.clone(),
        components.nodes.clone(),
        history_writer,
        5,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = signal_tx.send(true);
        }
    });

    let orchestrator = components.orchestrator;
    Arc::clone(&orchestrator).run(shutdown_rx).await;
    components.integrations.disconnect_all().await;
    Ok(())
}

fn export_training(config: &AgentBridgeConfig, since: Option<f64>, out: &std::path::Path, jsonl: bool) -> anyhow::Result<()> {
    let history = compose::open_history(config)?;
    let out_str = out.to_string_lossy().to_string();
    let export = history.export_for_training(since, None, Some(&out_str), jsonl)?;
    println!(
        "exported {} state changes, {} messages, {} actions to {}",
        export.state_changes.len(),
        export.messages.len(),
        export.actions.len(),
        out_str
    );
    Ok(())
}

fn cleanup(config: &AgentBridgeConfig, days: u32) -> anyhow::Result<()> {
    let history = compose::open_history(config)?;
    history.cleanup_old_records(days);
    println!("cleaned up records older than {days} days");
    Ok(())
}
