//! Live change feed over a websocket

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    Extension,
};
use cleanit_database::{Role, User};
use cleanit_operations::EventEnvelope;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::middleware::AuthUser;
use crate::state::GatewayState;

/// Client events received from the websocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedClientEvent {
    /// Heartbeat to keep the connection alive
    Ping,
}

/// Server events sent to websocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedServerEvent {
    /// Sent once after the upgrade
    Hello { user_id: String, role: Role },
    /// Heartbeat response
    Pong,
    /// A change the user may see
    Event { envelope: EventEnvelope },
    /// The session behind the socket was signed out, expired or deactivated
    SessionEnded,
}

/// Admins see every change, managers everything touching their company,
/// everyone else only changes addressed to them.
pub fn visible_to(user: &User, envelope: &EventEnvelope) -> bool {
    match user.role() {
        Role::Admin => true,
        Role::Manager => {
            envelope.is_for(&user.public_id)
                || user
                    .company_id()
                    .is_some_and(|company| envelope.concerns_company(company))
        }
        Role::Worker | Role::Client => envelope.is_for(&user.public_id),
    }
}

/// Re-resolve the session behind a live feed. `None` once it was signed out,
/// expired or its account deactivated.
pub async fn revalidate_session(state: &GatewayState, token: &str) -> Option<User> {
    match state.user_service().authenticate(token).await {
        Ok(user) => Some(user),
        Err(error) => {
            debug!(error = %error, "feed session no longer valid");
            None
        }
    }
}

/// Upgrade an authenticated request to the change feed
pub async fn feed_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
) -> Response {
    let events = state.events.subscribe();
    ws.on_upgrade(move |socket| handle_feed(socket, state, auth, events))
}

async fn handle_feed(
    socket: WebSocket,
    state: Arc<GatewayState>,
    auth: AuthUser,
    mut events: broadcast::Receiver<EventEnvelope>,
) {
    let AuthUser { user, token } = auth;
    let (mut sender, mut receiver) = socket.split();
    let (outgoing, mut outgoing_rx) = mpsc::channel::<FeedServerEvent>(32);
    // Role or company changes picked up by a session check also rescope the feed.
    let (current_user, watched_user) = watch::channel(user.clone());

    debug!(user = %user.public_id, "feed connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = outgoing_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(error) => {
                    warn!(error = %error, "failed to encode feed event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let hello = FeedServerEvent::Hello {
        user_id: user.public_id.clone(),
        role: user.role(),
    };
    if outgoing.send(hello).await.is_err() {
        return;
    }

    let event_outgoing = outgoing.clone();
    let event_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => {
                    if !visible_to(&watched_user.borrow(), &envelope) {
                        continue;
                    }
                    if event_outgoing
                        .send(FeedServerEvent::Event { envelope })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user = %watched_user.borrow().public_id, skipped, "feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let period = state.feed_session_check;
    let mut session_check = interval_at(Instant::now() + period, period);
    session_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<FeedClientEvent>(&text) {
                    Ok(FeedClientEvent::Ping) => {
                        if outgoing.send(FeedServerEvent::Pong).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => debug!(error = %error, "ignoring unknown feed message"),
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = session_check.tick() => match revalidate_session(&state, &token).await {
                Some(fresh) => {
                    current_user.send_replace(fresh);
                }
                None => {
                    info!(user = %user.public_id, "closing feed for ended session");
                    let _ = outgoing.send(FeedServerEvent::SessionEnded).await;
                    break;
                }
            },
        }
    }

    event_task.abort();
    drop(outgoing);
    let _ = send_task.await;

    debug!(user = %user.public_id, "feed disconnected");
}
