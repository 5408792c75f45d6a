//! REST API endpoints for the gateway

pub mod auth;
pub mod buildings;
pub mod companies;
pub mod conversations;
pub mod health;
pub mod jobs;
pub mod reports;
pub mod requests;
pub mod reviews;
pub mod users;

use axum::{routing::get, Router};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

/// Routes that need no session
pub fn create_public_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::create_public_auth_routes())
}

/// Routes that run behind the authentication middleware
pub fn create_protected_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .merge(auth::create_auth_routes())
        .merge(users::create_user_routes())
        .merge(companies::create_company_routes())
        .merge(buildings::create_building_routes())
        .merge(jobs::create_job_routes())
        .merge(requests::create_request_routes())
        .merge(conversations::create_conversation_routes())
        .merge(reviews::create_review_routes())
        .merge(reports::create_report_routes())
}

/// Optional body of the cancel endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelBody {
    pub reason: Option<String>,
}

pub(crate) fn parse_param<T>(value: &str) -> GatewayResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse::<T>()
        .map_err(|error| GatewayError::InvalidRequest(error.to_string()))
}

pub(crate) fn parse_optional<T>(value: Option<&str>) -> GatewayResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(parse_param).transpose()
}
