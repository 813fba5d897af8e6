//! Matchmaking and court assignment server.
//!
//! Serves the host-facing matchmaking API over HTTP, backed by either
//! in-memory storage or PostgreSQL.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Error};
use courtside::completion::LogSink;
use courtside::db::Database;
use courtside::engine::MatchmakingManager;
use courtside::pool::{
    DirectorySeed, EventDirectory, GuestDirectory, InMemoryEventDirectory, InMemoryGuestDirectory,
    ParticipantPool, PgDirectory,
};
use courtside::{AnyMatchStore, InMemoryMatchStore, PgMatchStore, TokenVerifier};
use cs_server::api;
use cs_server::config::{CliOverrides, ServerConfig, StorageBackend};
use cs_server::{logging, metrics};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the courtside matchmaking server

USAGE:
  cs_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --storage    BACKEND     memory or postgres          [default: env STORAGE_BACKEND or memory]
  --seed       PATH        JSON directory seed for the memory backend [default: env SEED_FILE]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               HS256 secret for host tokens (required, >= 32 chars)
  METRICS_BIND             Prometheus listener address (optional)
  DEFAULT_MATCH_MODE       singles or doubles
  DEFAULT_SKILL_TOLERANCE  Rating tolerance used when a request omits it
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        storage: pargs.opt_value_from_str::<_, StorageBackend>("--storage")?,
        seed_file: pargs.opt_value_from_os_str("--seed", |s| {
            Ok::<PathBuf, std::convert::Infallible>(PathBuf::from(s))
        })?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics listening on {}", addr);
    }

    let (store, events, guests): (AnyMatchStore, Arc<dyn EventDirectory>, Arc<dyn GuestDirectory>) =
        match config.storage {
            StorageBackend::Memory => {
                let events = Arc::new(InMemoryEventDirectory::new());
                let guests = Arc::new(InMemoryGuestDirectory::new());
                if let Some(path) = &config.seed_file {
                    DirectorySeed::load(path)?.apply(&events, &guests)?;
                    info!("Seeded directories from {}", path.display());
                }
                (
                    AnyMatchStore::from(InMemoryMatchStore::new()),
                    events as Arc<dyn EventDirectory>,
                    guests as Arc<dyn GuestDirectory>,
                )
            }
            StorageBackend::Postgres => {
                info!("Connecting to database");
                let db = Database::new(&config.database)
                    .await
                    .context("Failed to connect to database")?;
                db.migrate().await.context("Failed to apply migrations")?;
                info!("Database connected successfully");

                let directory = Arc::new(PgDirectory::new(db.pool().clone()));
                (
                    AnyMatchStore::from(PgMatchStore::new(db.pool().clone())),
                    directory.clone() as Arc<dyn EventDirectory>,
                    directory as Arc<dyn GuestDirectory>,
                )
            }
        };
    info!("Using {} match storage", store.backend_name());

    let manager = MatchmakingManager::new(
        Arc::new(store),
        ParticipantPool::new(events, guests),
        Arc::new(LogSink),
        config.engine,
    );

    let state = api::AppState {
        manager,
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!("Server is running at http://{}. Press Ctrl+C to stop.", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
