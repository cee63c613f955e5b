use agentbridge_core::config::{AgentBridgeConfig, FarcasterConfig, MatrixConfig};
use anyhow::{bail, Context};

use crate::cli::{AddIntegrationArgs, IntegrationPlatform};
use crate::compose;

/// `integrations list`: shows every configured platform and, if the
/// orchestrator isn't already running, attempts a fresh connection to
/// report live status (spec §6 Integration contract: connect/status).
pub async fn list(config: &AgentBridgeConfig) -> anyhow::Result<()> {
    let components = compose::build(config)?;
    components.integrations.connect_all().await;
    let statuses = components.integrations.statuses().await;
    if statuses.is_empty() {
        println!("no integrations configured");
        return Ok(());
    }
    for (name, status) in statuses {
        println!("{name}: {status:?}");
    }
    components.integrations.disconnect_all().await;
    Ok(())
}

/// `integrations test`: connects every configured integration once and
/// runs its lightweight liveness check, reporting pass/fail per platform.
pub async fn test(config: &AgentBridgeConfig) -> anyhow::Result<bool> {
    let components = compose::build(config)?;
    components.integrations.connect_all().await;
    let mut all_ok = true;
    for (name, _status) in components.integrations.statuses().await {
        let Some(integration) = components.integrations.get(&name) else {
            continue;
        };
        let guard = integration.lock().await;
        match guard.test_connection().await {
            Ok(()) => println!("{name}: ok"),
            Err(e) => {
                println!("{name}: failed ({e})");
                all_ok = false;
            }
        }
    }
    components.integrations.disconnect_all().await;
    Ok(all_ok)
}

/// `integrations add`: writes (or overwrites) the named platform's
/// `[channels.*]` block in the on-disk config file. Integrations are
/// statically configured (spec §6), so "add" means editing the config a
/// future `run` will load rather than registering anything live.
pub fn add(config_path: &str, args: &AddIntegrationArgs) -> anyhow::Result<()> {
    let mut raw = load_raw_toml(config_path)?;
    let channels = raw
        .entry("channels".to_string())
        .or_insert_with(|| toml::Value::Table(Default::default()))
        .as_table_mut()
        .context("`channels` must be a table")?;

    match args.platform {
        IntegrationPlatform::Matrix => {
            let homeserver_url = args.homeserver_url.clone().context("--homeserver-url is required for matrix")?;
            let user_id = args.user_id.clone().context("--user-id is required for matrix")?;
            let access_token = args.access_token.clone().context("--access-token is required for matrix")?;
            let matrix = MatrixConfig {
                homeserver_url,
                user_id,
                access_token,
                device_id: args.device_id.clone(),
            };
            channels.insert("matrix".to_string(), toml::Value::try_from(&matrix)?);
        }
        IntegrationPlatform::Farcaster => {
            let hub_url = args.hub_url.clone().context("--hub-url is required for farcaster")?;
            let signer_uuid = args.signer_uuid.clone().context("--signer-uuid is required for farcaster")?;
            let fid = args.fid.context("--fid is required for farcaster")?;
            let api_key = args.api_key.clone().context("--api-key is required for farcaster")?;
            let farcaster = FarcasterConfig {
                hub_url,
                signer_uuid,
                fid,
                api_key,
            };
            channels.insert("farcaster".to_string(), toml::Value::try_from(&farcaster)?);
        }
    }

    write_raw_toml(config_path, &raw)
}

/// `integrations remove`: deletes the named platform's `[channels.*]`
/// block from the config file, if present.
pub fn remove(config_path: &str, platform: IntegrationPlatform) -> anyhow::Result<()> {
    let mut raw = load_raw_toml(config_path)?;
    if let Some(channels) = raw.get_mut("channels").and_then(|v| v.as_table_mut()) {
        channels.remove(platform.as_str());
    }
    write_raw_toml(config_path, &raw)
}

fn load_raw_toml(config_path: &str) -> anyhow::Result<toml::value::Table> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(toml::value::Table::new());
    }
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading config file {config_path}"))?;
    let value: toml::Value = toml::from_str(&text)
        .with_context(|| format!("parsing config file {config_path} as TOML"))?;
    match value {
        toml::Value::Table(table) => Ok(table),
        _ => bail!("config file {config_path} is not a TOML table at its root"),
    }
}

fn write_raw_toml(config_path: &str, raw: &toml::value::Table) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(config_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(raw).context("serializing config back to TOML")?;
    std::fs::write(config_path, text).with_context(|| format!("writing config file {config_path}"))
}
