use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use starforge_server::api::{self, AppState};
use starforge_server::auth::StoreTokenVerifier;
use starforge_server::config::ServerConfig;
use starforge_server::generation::{seed_galaxy, seed_players};
use starforge_server::hub;
use starforge_server::ledger::CreditLedger;
use starforge_server::simulation::TickRunner;
use starforge_server::store::{MemoryStore, RecordStore, TableExt};
use starforge_server::tables::{WorldClock, WORLD_CLOCK_ID};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "starforge-server", about = "Starforge galaxy simulation server")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    seed_galaxy(store.as_ref(), &config.galaxy, &config.network)?;
    seed_players(store.as_ref(), &config.galaxy.players)?;
    if store.find::<WorldClock>(WORLD_CLOCK_ID)?.is_none() {
        store.save(&WorldClock::default())?;
    }

    let (hub, _hub_task) = hub::spawn(&config.hub);
    let ledger = Arc::new(CreditLedger::new(store.clone()));
    let ticks = Arc::new(TickRunner::new(store.clone(), ledger, hub.clone()));
    tokio::spawn(
        ticks
            .clone()
            .run(Duration::from_secs(config.tick_interval_secs.max(1))),
    );

    let app = api::configure(AppState {
        hub,
        ticks,
        verifier: Arc::new(StoreTokenVerifier::new(store)),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("could not bind {}", config.bind))?;
    log::info!(
        "Starforge listening on {} (tick every {}s)",
        config.bind,
        config.tick_interval_secs
    );
    axum::serve(listener, app).await?;
    Ok(())
}
