//! Account administration endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use cleanit_database::{Page, Role, RoleProfile, UpdateUserRequest, User, UserFilter};
use cleanit_users::CreateAccountRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::parse_optional;
use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub login_id: String,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub company_id: Option<String>,
    /// Role-specific attributes, tagged with `role`.
    #[schema(value_type = Object)]
    pub profile: RoleProfile,
    pub is_active: bool,
    pub is_verified: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.public_id.clone(),
            role: user.role().to_string(),
            company_id: user.company_id().map(str::to_string),
            login_id: user.login_id,
            name: user.name,
            phone: user.phone,
            contact_email: user.contact_email,
            address: user.address,
            profile: user.profile,
            is_active: user.is_active,
            is_verified: user.is_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserBody {
    pub login_id: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    /// Role-specific attributes, tagged with `role`.
    #[schema(value_type = Object)]
    pub profile: RoleProfile,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub profile: Option<RoleProfile>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyUserBody {
    pub is_verified: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveBody {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// client, worker, manager or admin
    pub role: Option<String>,
    pub company_id: Option<String>,
    pub is_active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create user routes
pub fn create_user_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:user_id", get(get_user).put(update_user))
        .route("/api/users/:user_id/verify", post(verify_user))
        .route("/api/users/:user_id/active", post(set_user_active))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Accounts matching the filter", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing manage_users", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListUsersQuery>,
) -> GatewayResult<Json<Vec<UserResponse>>> {
    let filter = UserFilter {
        role: parse_optional::<Role>(query.role.as_deref())?,
        company_id: query.company_id,
        is_active: query.is_active,
    };

    let users = state
        .user_service()
        .list_users(&auth.user, &filter, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserBody,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Missing manage_users", body = ErrorResponse),
        (status = 409, description = "Login id already in use", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateUserBody>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .user_service()
        .create_account(
            &auth.user,
            CreateAccountRequest {
                login_id: body.login_id,
                password: body.password,
                name: body.name,
                phone: body.phone,
                contact_email: body.contact_email,
                address: body.address,
                profile: body.profile,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The account", body = UserResponse),
        (status = 403, description = "Not yourself and missing manage_users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.user_service().get_user(&auth.user, &user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .user_service()
        .update_user(
            &auth.user,
            &user_id,
            UpdateUserRequest {
                name: body.name,
                phone: body.phone,
                contact_email: body.contact_email,
                address: body.address,
                profile: body.profile,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/verify",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    request_body = VerifyUserBody,
    responses(
        (status = 200, description = "Verification updated", body = UserResponse),
        (status = 403, description = "Missing manage_users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn verify_user(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<VerifyUserBody>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .user_service()
        .set_verified(&auth.user, &user_id, body.is_verified)
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/active",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    request_body = SetActiveBody,
    responses(
        (status = 200, description = "Activation updated", body = UserResponse),
        (status = 400, description = "Cannot deactivate yourself", body = ErrorResponse),
        (status = 403, description = "Missing manage_users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn set_user_active(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .user_service()
        .set_active(&auth.user, &user_id, body.is_active)
        .await?;
    Ok(Json(user.into()))
}
