//! Service request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use cleanit_database::{
    Assignment, Page, RequestFilter, RequestPriority, RequestResponse, RequestStatus, RequestType,
    ServiceRequest,
};
use cleanit_operations::{AssignRequest, NewServiceRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::{parse_optional, parse_param, CancelBody};
use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceRequestResponse {
    pub id: String,
    pub client_id: String,
    pub building_id: String,
    pub request_type: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub photos: Vec<String>,
    /// pending, assigned, in_progress, completed or cancelled
    pub status: String,
    #[schema(value_type = Option<Object>)]
    pub assigned_to: Option<Assignment>,
    pub approved_by_admin: bool,
    #[schema(value_type = Option<Object>)]
    pub response: Option<RequestResponse>,
    pub cancel_reason: Option<String>,
    pub assigned_at: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ServiceRequest> for ServiceRequestResponse {
    fn from(request: ServiceRequest) -> Self {
        Self {
            id: request.public_id,
            client_id: request.client_id,
            building_id: request.building_id,
            request_type: request.request_type.as_str().to_string(),
            priority: request.priority.as_str().to_string(),
            title: request.title,
            description: request.description,
            photos: request.photos,
            status: request.status.as_str().to_string(),
            assigned_to: request.assigned_to,
            approved_by_admin: request.approved_by_admin,
            response: request.response,
            cancel_reason: request.cancel_reason,
            assigned_at: request.assigned_at,
            started_at: request.started_at,
            completed_at: request.completed_at,
            cancelled_at: request.cancelled_at,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequestBody {
    pub building_id: String,
    /// regular_cleaning, special_cleaning, complaint, maintenance or other
    pub request_type: String,
    /// low, medium, high or urgent; defaults to medium
    pub priority: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequestBody {
    pub worker_id: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteRequestBody {
    pub notes: Option<String>,
    /// Must live under `requests/{request_id}/`
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRequestsQuery {
    pub building_id: Option<String>,
    pub status: Option<String>,
    /// Requests routed to this company
    pub company_id: Option<String>,
    /// Requests routed to this worker
    pub worker_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create service request routes
pub fn create_request_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/requests", get(list_requests).post(create_request))
        .route("/api/requests/:request_id", get(get_request))
        .route("/api/requests/:request_id/assign", post(assign_request))
        .route("/api/requests/:request_id/start", post(start_request))
        .route("/api/requests/:request_id/complete", post(complete_request))
        .route("/api/requests/:request_id/cancel", post(cancel_request))
}

#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    params(ListRequestsQuery),
    responses(
        (status = 200, description = "Requests visible to the caller", body = Vec<ServiceRequestResponse>),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn list_requests(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListRequestsQuery>,
) -> GatewayResult<Json<Vec<ServiceRequestResponse>>> {
    let filter = RequestFilter {
        building_id: query.building_id,
        status: parse_optional::<RequestStatus>(query.status.as_deref())?,
        assigned_company_id: query.company_id,
        assigned_worker_id: query.worker_id,
        ..RequestFilter::default()
    };

    let requests = state
        .request_service()
        .list(&auth.user, filter, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(requests.into_iter().map(ServiceRequestResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = CreateServiceRequestBody,
    responses(
        (status = 201, description = "Request raised", body = ServiceRequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Missing create_requests or not the owner", body = ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateServiceRequestBody>,
) -> GatewayResult<(StatusCode, Json<ServiceRequestResponse>)> {
    let request_type = parse_param::<RequestType>(&body.request_type)?;
    let priority = parse_optional::<RequestPriority>(body.priority.as_deref())?
        .unwrap_or(RequestPriority::Medium);

    let request = state
        .request_service()
        .create(
            &auth.user,
            NewServiceRequest {
                building_id: body.building_id,
                request_type,
                priority,
                title: body.title,
                description: body.description,
                photos: body.photos,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request.into())))
}

#[utoipa::path(
    get,
    path = "/api/requests/{request_id}",
    tag = "Requests",
    params(("request_id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "The request", body = ServiceRequestResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
) -> GatewayResult<Json<ServiceRequestResponse>> {
    let request = state.request_service().get(&auth.user, &request_id).await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/api/requests/{request_id}/assign",
    tag = "Requests",
    params(("request_id" = String, Path, description = "Request id")),
    request_body = AssignRequestBody,
    responses(
        (status = 200, description = "Request assigned", body = ServiceRequestResponse),
        (status = 400, description = "No target, or target inactive", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Request is not pending", body = ErrorResponse)
    )
)]
pub async fn assign_request(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
    Json(body): Json<AssignRequestBody>,
) -> GatewayResult<Json<ServiceRequestResponse>> {
    let request = state
        .request_service()
        .assign(
            &auth.user,
            &request_id,
            AssignRequest {
                worker_id: body.worker_id,
                company_id: body.company_id,
            },
        )
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/api/requests/{request_id}/start",
    tag = "Requests",
    params(("request_id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Work started", body = ServiceRequestResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Request is not assigned", body = ErrorResponse)
    )
)]
pub async fn start_request(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
) -> GatewayResult<Json<ServiceRequestResponse>> {
    let request = state.request_service().start(&auth.user, &request_id).await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/api/requests/{request_id}/complete",
    tag = "Requests",
    params(("request_id" = String, Path, description = "Request id")),
    request_body = CompleteRequestBody,
    responses(
        (status = 200, description = "Request completed", body = ServiceRequestResponse),
        (status = 400, description = "Invalid response", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Request is not in progress", body = ErrorResponse)
    )
)]
pub async fn complete_request(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
    body: Option<Json<CompleteRequestBody>>,
) -> GatewayResult<Json<ServiceRequestResponse>> {
    let response = body.map(|Json(body)| RequestResponse {
        notes: body.notes,
        photos: body.photos,
        completed_at: None,
    });

    let request = state
        .request_service()
        .complete(&auth.user, &request_id, response)
        .await?;
    Ok(Json(request.into()))
}

#[utoipa::path(
    post,
    path = "/api/requests/{request_id}/cancel",
    tag = "Requests",
    params(("request_id" = String, Path, description = "Request id")),
    request_body = CancelBody,
    responses(
        (status = 200, description = "Request cancelled", body = ServiceRequestResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Request already finished", body = ErrorResponse)
    )
)]
pub async fn cancel_request(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> GatewayResult<Json<ServiceRequestResponse>> {
    let reason = body.and_then(|Json(body)| body.reason);
    let request = state
        .request_service()
        .cancel(&auth.user, &request_id, reason)
        .await?;
    Ok(Json(request.into()))
}
