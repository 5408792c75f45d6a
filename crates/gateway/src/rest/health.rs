use axum::{extract::State, Json};
use cleanit_database::{timestamp_now, DatabaseConnection};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer
    pub status: String,
    pub database: bool,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    let database = match DatabaseConnection::from_pool(state.pool.clone())
        .test_connection()
        .await
    {
        Ok(()) => true,
        Err(error) => {
            warn!(error = %error, "database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
        timestamp: timestamp_now(),
    })
}
