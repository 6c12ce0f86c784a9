//! Real-time 4x4x4 tic-tac-toe game server.
//!
//! Wires the qubic engine to an axum HTTP/WebSocket surface with
//! database-backed persistence and token-based authentication.

mod api;
mod config;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use tracing::info;

use qubic::{
    auth::AuthManager,
    db::{
        Database,
        repository::{PgGameStore, PgSessionStore},
    },
    game::processor::MoveProcessor,
    net::GameHub,
};

use config::ServerConfig;

const HELP: &str = "\
Run a real-time 4x4x4 tic-tac-toe game server

USAGE:
  qb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Access-token signing secret (required)
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

    let bind_override = pargs.opt_value_from_str("--bind")?;
    let database_url_override = pargs.opt_value_from_str("--db-url")?;

    let config = ServerConfig::from_env(bind_override, database_url_override)?;
    config.validate()?;

    logging::init();
    info!("Starting game server at {}", config.bind);

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected successfully");

    let pool = Arc::new(db.pool().clone());
    let games = Arc::new(PgGameStore::new(db.pool().clone()));
    let sessions = Arc::new(PgSessionStore::new(db.pool().clone()));
    let processor = Arc::new(MoveProcessor::new(games.clone()));
    let hub = Arc::new(GameHub::new());
    let auth_manager = Arc::new(AuthManager::new(config.security.jwt_secret.clone()));

    let state = api::AppState {
        auth_manager,
        games,
        sessions,
        processor,
        hub,
        pool,
    };
    let app = api::create_router(state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
