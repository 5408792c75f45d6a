//! Authentication REST endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use cleanit_auth::AuthSession;
use cleanit_database::{ClientProfile, User};
use cleanit_users::{can_access_admin_ui, main_screen, permissions_for, RegisterClientRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::users::UserResponse;
use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub login_id: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub business_number: Option<String>,
    pub billing_address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: String,
}

impl SessionResponse {
    pub fn new(session: AuthSession, user: User) -> Self {
        Self {
            token: session.token,
            user: user.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

/// The signed-in account plus what the frontend needs to route it.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    pub main_screen: String,
    pub can_access_admin_ui: bool,
    pub permissions: Vec<String>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        let role = user.role();
        Self {
            main_screen: main_screen(role).as_str().to_string(),
            can_access_admin_ui: can_access_admin_ui(role),
            permissions: permissions_for(role)
                .iter()
                .map(|permission| permission.as_str().to_string())
                .collect(),
            user: user.into(),
        }
    }
}

/// Routes reachable without a session
pub fn create_public_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Routes for the signed-in user
pub fn create_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Client account created, pending verification", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Login id already in use", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<RegisterRequest>,
) -> GatewayResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service()
        .register_client(RegisterClientRequest {
            login_id: body.login_id,
            password: body.password,
            name: body.name,
            phone: body.phone,
            contact_email: body.contact_email,
            address: body.address,
            profile: ClientProfile {
                company_name: body.company_name,
                business_number: body.business_number,
                billing_address: body.billing_address,
            },
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account deactivated", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<LoginRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    let (user, session) = state
        .user_service()
        .sign_in(&body.login_id, &body.password)
        .await?;

    Ok(Json(SessionResponse::new(session, user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
) -> GatewayResult<StatusCode> {
    state.user_service().sign_out(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn me(Extension(auth): Extension<AuthUser>) -> Json<MeResponse> {
    Json(auth.user.into())
}
