//! # CleanIT Gateway Crate
//!
//! HTTP REST and websocket surface of the CleanIT backend. Handlers translate
//! JSON bodies into service calls; permission and ownership checks live in
//! the services.
//!
//! ## Architecture
//!
//! - **REST**: HTTP API endpoints with OpenAPI documentation
//! - **WebSocket**: the live change feed
//! - **State**: shared services and the event bus
//! - **Middleware**: authentication, CORS and request logging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cleanit_gateway::{create_router, GatewayState};
//!
//! let state = GatewayState::new(pool, &config);
//! let app = create_router(state, &config.http.cors_origins);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use middleware::{auth_middleware, AuthUser};
pub use state::GatewayState;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "CleanIT API", description = "Cleaning operations backend"),
    paths(
        rest::health::health_check,
        rest::auth::register,
        rest::auth::login,
        rest::auth::logout,
        rest::auth::me,
        rest::users::list_users,
        rest::users::create_user,
        rest::users::get_user,
        rest::users::update_user,
        rest::users::verify_user,
        rest::users::set_user_active,
        rest::companies::list_companies,
        rest::companies::create_company,
        rest::companies::get_company,
        rest::companies::set_company_active,
        rest::buildings::list_buildings,
        rest::buildings::create_building,
        rest::buildings::get_building,
        rest::buildings::update_building,
        rest::jobs::list_jobs,
        rest::jobs::create_job,
        rest::jobs::get_job,
        rest::jobs::start_job,
        rest::jobs::add_job_photo,
        rest::jobs::complete_job,
        rest::jobs::cancel_job,
        rest::requests::list_requests,
        rest::requests::create_request,
        rest::requests::get_request,
        rest::requests::assign_request,
        rest::requests::start_request,
        rest::requests::complete_request,
        rest::requests::cancel_request,
        rest::conversations::list_conversations,
        rest::conversations::create_conversation,
        rest::conversations::get_conversation,
        rest::conversations::list_messages,
        rest::conversations::post_message,
        rest::reviews::list_reviews,
        rest::reviews::create_review,
        rest::reviews::worker_rating,
        rest::reports::summary,
    ),
    components(
        schemas(
            ErrorResponse,
            rest::CancelBody,
            rest::health::HealthResponse,
            rest::auth::RegisterRequest,
            rest::auth::LoginRequest,
            rest::auth::SessionResponse,
            rest::auth::MeResponse,
            rest::users::UserResponse,
            rest::users::CreateUserBody,
            rest::users::UpdateUserBody,
            rest::users::VerifyUserBody,
            rest::users::SetActiveBody,
            rest::companies::CompanyResponse,
            rest::companies::ManagerBody,
            rest::companies::CreateCompanyBody,
            rest::companies::CompanySignupResponse,
            rest::buildings::BuildingResponse,
            rest::buildings::CreateBuildingBody,
            rest::buildings::UpdateBuildingBody,
            rest::jobs::JobResponse,
            rest::jobs::CreateJobBody,
            rest::jobs::AddPhotoBody,
            rest::jobs::CompleteJobBody,
            rest::requests::ServiceRequestResponse,
            rest::requests::CreateServiceRequestBody,
            rest::requests::AssignRequestBody,
            rest::requests::CompleteRequestBody,
            rest::conversations::ConversationResponse,
            rest::conversations::MessageResponse,
            rest::conversations::CreateConversationBody,
            rest::conversations::PostMessageBody,
            rest::reviews::ReviewResponse,
            rest::reviews::RatingSummaryResponse,
            rest::reviews::CreateReviewBody,
            rest::reports::SummaryResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Registration and sessions"),
        (name = "Users", description = "Account administration"),
        (name = "Companies", description = "Cleaning companies"),
        (name = "Buildings", description = "Client buildings"),
        (name = "Jobs", description = "Scheduled cleanings"),
        (name = "Requests", description = "Client service requests"),
        (name = "Conversations", description = "Chat"),
        (name = "Reviews", description = "Job ratings"),
        (name = "Reports", description = "Dashboard totals"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the main application router with all routes
pub fn create_router(state: GatewayState, cors_origins: &[String]) -> Router {
    let state = Arc::new(state);

    let protected = rest::create_protected_routes()
        .merge(websocket::create_websocket_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(rest::create_public_routes())
        .merge(protected)
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(middleware::create_cors_middleware(cors_origins))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
