//! WebSocket endpoints for the gateway

pub mod feed;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all WebSocket routes. They sit behind the authentication middleware.
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/ws", get(feed::feed_websocket_handler))
}

pub use feed::{visible_to, FeedClientEvent, FeedServerEvent};
