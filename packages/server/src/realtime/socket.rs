use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::auth::authenticate_token;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SocketParams {
    /// Browsers and mobile socket clients cannot set headers on the upgrade
    /// request, so the bearer token travels in the query string.
    pub access_token: Option<String>,
}

/// Upgrade to the real-time change feed.
#[instrument(skip(state, params, ws))]
pub async fn updates_socket(
    State(state): State<AppState>,
    Query(params): Query<SocketParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = params
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(AppError::TokenMissing)?;
    let user = authenticate_token(&state, &token)?;

    Ok(ws.on_upgrade(move |socket| run_connection(state, socket, user.user_id)))
}

async fn run_connection(state: AppState, socket: WebSocket, user_id: Uuid) {
    let (connection_id, mut queue) = state.hub.register(user_id);
    let (mut sink, mut stream) = socket.split();

    let writer = async {
        while let Some(text) = queue.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    };

    // Clients never send anything meaningful; read only to notice the close.
    let reader = async {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    };

    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    state.hub.unregister(connection_id);
    debug!(%connection_id, %user_id, "Real-time connection closed");
}
