//! Dashboard totals

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    /// Accounts per role
    pub users: BTreeMap<String, i64>,
    /// Service requests per status
    pub requests: BTreeMap<String, i64>,
}

/// Create report routes
pub fn create_report_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/api/reports/summary", get(summary))
}

#[utoipa::path(
    get,
    path = "/api/reports/summary",
    tag = "Reports",
    responses(
        (status = 200, description = "Account and request totals", body = SummaryResponse),
        (status = 403, description = "Missing view_reports", body = ErrorResponse)
    )
)]
pub async fn summary(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
) -> GatewayResult<Json<SummaryResponse>> {
    let users = state.user_service().role_counts(&auth.user).await?;
    let requests = state.request_service().status_counts(&auth.user).await?;

    Ok(Json(SummaryResponse {
        users: users
            .into_iter()
            .map(|(role, count)| (role.to_string(), count))
            .collect(),
        requests: requests
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect(),
    }))
}
