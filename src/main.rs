//! Squad roster service.
//!
//! `squad-roster` (or `squad-roster serve`) runs the document service.
//! `squad-roster status` loads the roster the way the client does and prints
//! the totals, falling back to the local cache when the service is down.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use squad_roster::config::Config;
use squad_roster::db::{self, Repository};
use squad_roster::notice::{NoticeBoard, Notifier};
use squad_roster::session::Session;
use squad_roster::sync::{FileCache, HttpRemoteStore, SyncAdapter};
use squad_roster::{create_router, view, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match std::env::args().nth(1).as_deref() {
        None | Some("serve") => serve(config).await,
        Some("status") => status(config).await,
        Some(other) => Err(format!("unknown command: {} (expected serve or status)", other).into()),
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting squad roster service");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (ROSTER_API_PSK). Writes are open to everyone!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn status(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut remote = HttpRemoteStore::new(&config.remote_url, config.sync.poll_interval);
    if let Some(key) = &config.api_psk {
        remote = remote.with_api_key(key);
    }

    let (notifier, notices) = Notifier::channel();
    let adapter = SyncAdapter::new(
        Arc::new(remote),
        Arc::new(FileCache::new(config.cache_path.clone())),
        Arc::new(RwLock::new(Session::default())),
        notifier,
        config.sync,
    );

    let source = adapter.load().await;
    adapter.unsubscribe().await;

    let mut board = NoticeBoard::new(notices);
    board.refresh();
    for notice in board.visible() {
        println!("[{:?}] {}", notice.severity, notice.message);
    }

    let table = view::render(&adapter.state().await, false);
    println!("Source: {:?}", source);
    println!(
        "{}: kills {} deaths {} missions {}",
        table.general.name, table.general.kills, table.general.deaths, table.general.missions
    );
    for squad in &table.squads {
        println!("{} ({}, {} members)", squad.name, squad.colonel, squad.members.len());
    }
    println!(
        "Totals: kills {} deaths {} missions {}{}",
        table.totals.kills,
        table.totals.deaths,
        table.totals.missions,
        if table.totals.missions_overridden { " (override)" } else { "" }
    );

    Ok(())
}
