use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Operator CLI: a thin shell around the orchestrator and its supporting
/// crates (spec §6 "Operator CLI surface"). Not part of the core decision
/// loop itself.
#[derive(Parser, Debug)]
#[command(name = "agentbridge")]
#[command(about = "Runs and operates the autonomous social-media agent")]
pub struct Cli {
    /// Path to agentbridge.toml. Defaults to ~/.agentbridge/agentbridge.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the orchestrator's cycle loop and connect every configured
    /// integration. Runs until interrupted.
    Run,
    /// Export recorded history as training data.
    ExportTraining {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
        /// Only include records at or after this unix-seconds timestamp.
        #[arg(long, value_name = "TS")]
        since: Option<f64>,
        /// Write newline-delimited JSON (one state-change per line)
        /// instead of a single JSON document.
        #[arg(long)]
        jsonl: bool,
    },
    /// Delete history older than the given number of days.
    Cleanup {
        #[arg(long, value_name = "N")]
        days: u32,
    },
    /// Inspect or edit the configured platform integrations.
    Integrations(IntegrationsArgs),
}

#[derive(Args, Debug)]
pub struct IntegrationsArgs {
    #[command(subcommand)]
    pub action: IntegrationsCommand,
}

#[derive(Subcommand, Debug)]
pub enum IntegrationsCommand {
    /// List configured integrations and their current connection status.
    List,
    /// Connect to every configured integration once and report the result.
    Test,
    /// Add (or overwrite) an integration's configuration block.
    Add(AddIntegrationArgs),
    /// Remove an integration's configuration block.
    Remove {
        #[arg(value_enum)]
        platform: IntegrationPlatform,
    },
}

#[derive(Args, Debug)]
pub struct AddIntegrationArgs {
    #[arg(value_enum)]
    pub platform: IntegrationPlatform,

    /// Matrix: homeserver base URL, e.g. https://matrix.org
    #[arg(long)]
    pub homeserver_url: Option<String>,
    /// Matrix: bot's full user id, e.g. @bot:matrix.org
    #[arg(long)]
    pub user_id: Option<String>,
    /// Matrix: access token for the bot account
    #[arg(long)]
    pub access_token: Option<String>,
    #[arg(long)]
    pub device_id: Option<String>,

    /// Farcaster: hub API base URL
    #[arg(long)]
    pub hub_url: Option<String>,
    /// Farcaster: signer UUID registered with the hub
    #[arg(long)]
    pub signer_uuid: Option<String>,
    /// Farcaster: the bot account's fid
    #[arg(long)]
    pub fid: Option<u64>,
    /// Farcaster: hub API key
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrationPlatform {
    Matrix,
    Farcaster,
}

impl IntegrationPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationPlatform::Matrix => "matrix",
            IntegrationPlatform::Farcaster => "farcaster",
        }
    }
}
