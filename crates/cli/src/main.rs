mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;

use redshift_client::Client;
use redshift_core::{load_dotenv, ProviderConfig, ProviderSettings};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let command = args.command;
    let as_json = args.json;

    let config = load_config(args)?;
    config.log_summary();
    let client = Client::new(config);

    match command {
        Command::Check => check(&client, as_json).await,
        Command::Whoami => whoami(&client, as_json).await,
        Command::Namespace => namespace(&client, as_json).await,
    }
}

/// Environment, then settings file, then flags.
fn load_config(args: CliArgs) -> Result<ProviderConfig> {
    let mut settings = match &args.profile {
        Some(profile) => ProviderSettings::from_env_profiled(profile),
        None => ProviderSettings::from_env(),
    };

    if let Some(path) = &args.settings {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        let file = ProviderSettings::from_json_str(&raw)
            .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        settings = settings.overlay(file);
    }

    settings = settings.overlay(args.overrides.into_settings());

    ProviderConfig::try_from(settings).context("invalid provider configuration")
}

async fn check(client: &Client, as_json: bool) -> Result<()> {
    let conn = client.connect().await.context("connection check failed")?;
    let strategy = conn.strategy();
    let username = conn.username().to_string();
    conn.close().await.context("closing connection failed")?;
    info!(%strategy, %username, "Connection check passed");

    if as_json {
        println!(
            "{}",
            json!({ "ok": true, "strategy": strategy.to_string(), "username": username })
        );
    } else {
        println!("ok: connected as {username} ({strategy})");
    }
    Ok(())
}

async fn whoami(client: &Client, as_json: bool) -> Result<()> {
    let creds = client
        .credentials()
        .await
        .context("credential resolution failed")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&creds)?);
    } else {
        println!("user:     {}", creds.username);
        println!("host:     {}:{}/{}", creds.host, creds.port, creds.database);
        println!("strategy: {}", creds.strategy);
        match creds.expires_at {
            Some(at) => println!("expires:  {}", at.to_rfc3339()),
            None => println!("expires:  never"),
        }
    }
    Ok(())
}

async fn namespace(client: &Client, as_json: bool) -> Result<()> {
    let namespace = client.namespace().await.context("namespace lookup failed")?;
    if as_json {
        println!("{}", json!({ "namespace": namespace.to_string() }));
    } else {
        println!("{namespace}");
    }
    Ok(())
}
