// ABOUTME: Command-line simulator for the share relay.
// ABOUTME: Runs a named start-up scenario against in-memory collaborators and prints the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use share_relay::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// Signed in, every readiness signal arrives.
    Fast,
    /// Signed out, the share is parked while the user signs in.
    Detour,
    /// Signed in, only resources load; the timeout forces routing.
    Forced,
    /// Nothing becomes ready; the timeout discards the share.
    Discard,
}

#[derive(Parser)]
#[command(name = "share-sim")]
#[command(about = "Simulate app start-up with a pending share intent", long_about = None)]
struct Cli {
    /// Start-up scenario to run
    #[arg(value_enum)]
    scenario: Scenario,

    /// JSON coordinator config (timeout_ms, settle_delay_ms, routes, credential_key)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text the OS share sheet hands over
    #[arg(short, long, default_value = "have a look at https://x.example/shared")]
    link: String,
}

fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let Some(path) = path else {
        // Short bound so the timeout scenarios finish quickly
        return Ok(RelayConfig::builder()
            .timeout(Duration::from_secs(2))
            .settle_delay(Duration::from_millis(200))
            .build()?);
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    Ok(RelayConfig::from_json(&content)?)
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("share_relay=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Cli::parse();
    let config = load_config(args.config.as_deref())?;
    let timeout = config.timeout;
    tracing::info!(scenario = ?args.scenario, timeout = ?timeout, "Running share scenario");

    let credentials = match args.scenario {
        Scenario::Detour => MemoryCredentials::new(),
        _ => MemoryCredentials::with_token("sim-token"),
    };
    let source = Arc::new(MemoryIntentSource::new());
    let store = Arc::new(MemoryStore::new());
    let navigator = Arc::new(RecordingNavigator::new());

    source.share(args.link.as_str());
    let handle = ShareCoordinator::spawn(
        config,
        RelayContext {
            intents: source.clone(),
            store: store.clone(),
            credentials: Arc::new(credentials),
            navigator: navigator.clone(),
        },
    );

    let mut presentation = handle.presentation();
    let watcher = tokio::spawn(async move {
        while presentation.changed().await.is_ok() {
            let current = presentation.borrow_and_update().clone();
            if current.visible {
                println!("presented: {}", current.payload);
            }
        }
    });

    match args.scenario {
        Scenario::Fast | Scenario::Detour => {
            for flag in ReadinessFlag::ALL {
                handle.update_readiness(ReadinessUpdate::set(flag))?;
            }
        }
        Scenario::Forced => {
            handle.update_readiness(ReadinessUpdate::set(ReadinessFlag::ResourcesLoaded))?;
        }
        Scenario::Discard => {}
    }

    tokio::time::sleep(timeout + Duration::from_secs(1)).await;

    if let Scenario::Detour = args.scenario {
        println!("auth flow: signing in");
        handle.auth_flow_succeeded()?;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let status = handle.status().await?;
    println!("outcome:    {:?}", status.last_outcome);
    println!("navigation: {:?}", navigator.history().await);
    println!("storage:    {:?}", store.ops().await);
    println!("consumed:   {}", source.consumes());

    handle.shutdown().await;
    watcher.abort();
    Ok(())
}
