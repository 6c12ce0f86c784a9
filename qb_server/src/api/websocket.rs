//! WebSocket handler for real-time game play.
//!
//! Clients subscribe to a game's channel via `GET /ws/{game_id}?token=<jwt>`
//! and receive every broadcast for that game: move outcomes and presence
//! changes. Inbound messages are move attempts:
//!
//! ```json
//! { "game_id": 7, "move": [0, 1, 2] }
//! { "game_id": 7, "move": { "level": 0, "column": 1, "row": 2 } }
//! ```
//!
//! # Connection Flow
//!
//! 1. Token verified before the upgrade; unauthenticated connections get 401
//! 2. Presence record upserted and `player_status` broadcast on subscribe
//! 3. Each inbound frame refreshes the presence record (best-effort) and is
//!    processed as a move attempt; the outcome is broadcast to every
//!    subscriber of the game's channel
//! 4. On disconnect, presence records are deleted and a disconnected
//!    `player_status` is broadcast
//!
//! Unknown game ids and unparseable frames are dropped silently: no
//! broadcast, no persisted row. Infrastructure failures are logged and
//! produce no broadcast either.

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use qubic::{
    db::repository::{GameStore, SessionStore},
    game::entities::{GameId, UserId},
    net::{Broadcaster, GameMessage},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Inbound move attempt. The payload stays raw JSON: shape decisions belong
/// to the move processor's normalization step.
#[derive(Debug, Deserialize)]
struct InboundMove {
    game_id: GameId,
    #[serde(rename = "move")]
    payload: serde_json::Value,
}

/// Upgrade HTTP connection to WebSocket for real-time game communication.
///
/// Validates the JWT access token and establishes a WebSocket connection to
/// the specified game's channel. On authentication failure, returns
/// `401 Unauthorized` before the upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<GameId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    // Verify token
    let user_id = match state.auth_manager.verify_access_token(&query.token) {
        Ok(claims) => claims.sub,
        Err(_) => {
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, game_id, user_id, state))
}

/// Handle an established WebSocket connection: presence bookkeeping, the
/// broadcast-forwarding task, the inbound move loop, and cleanup.
async fn handle_socket(socket: WebSocket, game_id: GameId, user_id: UserId, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: game={game_id}, user={user_id}");

    // Transport-session identifier for the presence record.
    let connection_id = Uuid::new_v4().to_string();

    // Presence bookkeeping is fire-and-forget: a failed write never takes
    // the subscription down.
    if let Err(e) = state
        .sessions
        .upsert_session(game_id, user_id, &connection_id)
        .await
    {
        warn!("game {game_id}: presence upsert failed for user {user_id}: {e}");
    }

    let mut updates = state.hub.subscribe(game_id);
    state
        .hub
        .publish(game_id, GameMessage::player_status(user_id, true));

    // Forward hub broadcasts to this subscriber.
    let send_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(message) => {
                    let json = match serde_json::to_string(&message) {
                        Ok(j) => j,
                        Err(e) => {
                            error!("failed to serialize broadcast: {e}");
                            continue;
                        }
                    };

                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("game {game_id}: subscriber {user_id} lagged, missed {skipped} messages");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Receive move attempts from the client.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_move_message(&text, game_id, user_id, &state).await;
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: game={game_id}, user={user_id}");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {e}");
                break;
            }
            _ => {}
        }
    }

    // Cleanup on disconnect.
    send_task.abort();

    if let Err(e) = state.sessions.delete_sessions(game_id, user_id).await {
        warn!("game {game_id}: presence delete failed for user {user_id}: {e}");
    }
    state
        .hub
        .publish(game_id, GameMessage::player_status(user_id, false));

    info!("WebSocket disconnected: game={game_id}, user={user_id}");
}

/// Process one inbound move attempt and broadcast its outcome.
///
/// The commit completes before the corresponding broadcast; both happen on
/// this task, so per-game emission order matches commit order.
async fn handle_move_message(
    text: &str,
    subscribed_game_id: GameId,
    user_id: UserId,
    state: &AppState,
) {
    let inbound = match serde_json::from_str::<InboundMove>(text) {
        Ok(m) => m,
        Err(e) => {
            debug!("game {subscribed_game_id}: dropping unparseable frame from user {user_id}: {e}");
            return;
        }
    };

    // Refresh presence, but never let it block move processing.
    if let Err(e) = state
        .sessions
        .touch_session(subscribed_game_id, user_id)
        .await
    {
        debug!("game {subscribed_game_id}: presence touch failed for user {user_id}: {e}");
    }

    // Unknown game ids fail closed and silent: no broadcast, no row.
    let game = match state.games.find_game(inbound.game_id).await {
        Ok(Some(game)) => game,
        Ok(None) => {
            debug!("dropping move for unknown game {}", inbound.game_id);
            return;
        }
        Err(e) => {
            error!("game {}: lookup failed: {e}", inbound.game_id);
            return;
        }
    };

    match state
        .processor
        .process(&game, user_id, inbound.payload.into())
        .await
    {
        Ok(outcome) => {
            let message = if outcome.success {
                match (&outcome.game_move, game.opponent_of(user_id)) {
                    (Some(record), Some(current_turn_id)) => {
                        GameMessage::move_success(record, current_turn_id)
                    }
                    _ => {
                        error!("game {}: successful outcome without a move", inbound.game_id);
                        return;
                    }
                }
            } else {
                GameMessage::move_error(outcome.errors.unwrap_or_default())
            };

            state.hub.publish(inbound.game_id, message);
        }
        Err(e) => {
            // Storage faults are logged out-of-band; subscribers see nothing.
            error!(
                "game {}: move processing failed for user {user_id}: {e}",
                inbound.game_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_move_accepts_sequence_payloads() {
        let inbound: InboundMove =
            serde_json::from_value(json!({ "game_id": 7, "move": [0, 1, 2] })).unwrap();

        assert_eq!(inbound.game_id, 7);
        assert_eq!(inbound.payload, json!([0, 1, 2]));
    }

    #[test]
    fn inbound_move_accepts_keyed_payloads() {
        let inbound: InboundMove = serde_json::from_value(json!({
            "game_id": 7,
            "move": { "level": 1, "column": 2, "row": 3 },
        }))
        .unwrap();

        assert_eq!(inbound.payload["row"], 3);
    }

    #[test]
    fn frames_without_a_game_id_fail_to_parse() {
        assert!(serde_json::from_value::<InboundMove>(json!({ "move": [0, 1, 2] })).is_err());
    }
}
