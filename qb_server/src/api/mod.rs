//! HTTP/WebSocket API for the game server.
//!
//! The REST surface covers the game lifecycle around the real-time core:
//! listing joinable games, listing the caller's games, creating, joining,
//! and abandoning. Real-time play happens over the WebSocket route, where
//! subscribers receive every broadcast for a game's channel.
//!
//! # Modules
//!
//! - [`games`]: Game lifecycle endpoints (list, create, join, abandon)
//! - [`websocket`]: Real-time move submission and fan-out
//! - [`middleware`]: Bearer-token authentication for protected endpoints
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                          - Health check (public)
//! GET  /api/v1/games                    - List joinable games (auth required)
//! GET  /api/v1/games/mine               - List the caller's games (auth required)
//! POST /api/v1/games                    - Create game (auth required)
//! POST /api/v1/games/{game_id}/join     - Join game (auth required)
//! POST /api/v1/games/{game_id}/abandon  - Abandon game (auth required)
//! GET  /ws/{game_id}?token=<jwt>        - WebSocket (auth via query token)
//! ```

pub mod games;
pub mod middleware;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use qubic::{
    auth::AuthManager,
    db::repository::{PgGameStore, PgSessionStore},
    game::processor::MoveProcessor,
    net::GameHub,
};

/// Application state shared across all HTTP handlers and WebSocket
/// connections. Cloned per request; cheap due to the Arc wrappers.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub games: Arc<PgGameStore>,
    pub sessions: Arc<PgSessionStore>,
    pub processor: Arc<MoveProcessor<PgGameStore>>,
    pub hub: Arc<GameHub>,
    pub pool: Arc<PgPool>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    // Root routes (health check, WebSocket - not versioned)
    let root_routes = Router::new()
        .route("/health", get(health_check))
        // WebSocket route handles its own auth via query parameter
        .route("/ws/{game_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/games", get(games::list_games).post(games::create_game))
        .route("/games/mine", get(games::my_games))
        .route("/games/{game_id}/join", post(games::join_game))
        .route("/games/{game_id}/abandon", post(games::abandon_game))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Probes database connectivity and returns `200 OK` when healthy, or
/// `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&*state.pool)
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
