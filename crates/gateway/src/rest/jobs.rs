//! Job scheduling and execution endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use cleanit_database::{Job, JobFilter, JobStatus, Page, PhotoKind};
use cleanit_operations::NewJob;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::{parse_optional, CancelBody};
use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct JobResponse {
    pub id: String,
    pub building_id: String,
    pub worker_id: String,
    pub company_id: Option<String>,
    /// scheduled, in_progress, completed or cancelled
    pub status: String,
    pub scheduled_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub cleaning_areas: Vec<String>,
    pub before_photos: Vec<String>,
    pub after_photos: Vec<String>,
    pub completion_rate: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.public_id,
            building_id: job.building_id,
            worker_id: job.worker_id,
            company_id: job.company_id,
            status: job.status.as_str().to_string(),
            scheduled_at: job.scheduled_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            cancelled_at: job.cancelled_at,
            cleaning_areas: job.cleaning_areas,
            before_photos: job.before_photos,
            after_photos: job.after_photos,
            completion_rate: job.completion_rate,
            notes: job.notes,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJobBody {
    pub building_id: String,
    pub worker_id: String,
    /// RFC 3339 timestamp
    pub scheduled_at: String,
    /// Defaults to the building's cleaning areas
    pub cleaning_areas: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPhotoBody {
    /// before or after
    pub kind: String,
    /// Must live under `jobs/{job_id}/{kind}/`
    pub url: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteJobBody {
    /// Percentage of the planned areas finished, 0 to 100
    pub completion_rate: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListJobsQuery {
    pub worker_id: Option<String>,
    pub building_id: Option<String>,
    pub company_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create job routes
pub fn create_job_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/:job_id", get(get_job))
        .route("/api/jobs/:job_id/start", post(start_job))
        .route("/api/jobs/:job_id/photos", post(add_job_photo))
        .route("/api/jobs/:job_id/complete", post(complete_job))
        .route("/api/jobs/:job_id/cancel", post(cancel_job))
}

fn parse_photo_kind(kind: &str) -> GatewayResult<PhotoKind> {
    match kind {
        "before" => Ok(PhotoKind::Before),
        "after" => Ok(PhotoKind::After),
        other => Err(GatewayError::InvalidRequest(format!(
            "photo kind must be before or after, got {other}"
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Jobs visible to the caller", body = Vec<JobResponse>),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn list_jobs(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListJobsQuery>,
) -> GatewayResult<Json<Vec<JobResponse>>> {
    let filter = JobFilter {
        worker_id: query.worker_id,
        building_id: query.building_id,
        company_id: query.company_id,
        owner_id: None,
        status: parse_optional::<JobStatus>(query.status.as_deref())?,
    };

    let jobs = state
        .job_service()
        .list(&auth.user, filter, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body = CreateJobBody,
    responses(
        (status = 201, description = "Job scheduled", body = JobResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Missing manage_jobs", body = ErrorResponse),
        (status = 404, description = "Building or worker not found", body = ErrorResponse)
    )
)]
pub async fn create_job(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateJobBody>,
) -> GatewayResult<(StatusCode, Json<JobResponse>)> {
    let job = state
        .job_service()
        .create(
            &auth.user,
            NewJob {
                building_id: body.building_id,
                worker_id: body.worker_id,
                scheduled_at: body.scheduled_at,
                cleaning_areas: body.cleaning_areas,
                notes: body.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(job.into())))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{job_id}",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "The job", body = JobResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Job not found", body = ErrorResponse)
    )
)]
pub async fn get_job(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
) -> GatewayResult<Json<JobResponse>> {
    let job = state.job_service().get(&auth.user, &job_id).await?;
    Ok(Json(job.into()))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/start",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job started", body = JobResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Job not found", body = ErrorResponse),
        (status = 409, description = "Job is not scheduled", body = ErrorResponse)
    )
)]
pub async fn start_job(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
) -> GatewayResult<Json<JobResponse>> {
    let job = state.job_service().start(&auth.user, &job_id).await?;
    Ok(Json(job.into()))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/photos",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Job id")),
    request_body = AddPhotoBody,
    responses(
        (status = 200, description = "Photo attached", body = JobResponse),
        (status = 400, description = "Wrong kind, path or job state", body = ErrorResponse),
        (status = 403, description = "Job belongs to another worker", body = ErrorResponse),
        (status = 404, description = "Job not found", body = ErrorResponse)
    )
)]
pub async fn add_job_photo(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
    Json(body): Json<AddPhotoBody>,
) -> GatewayResult<Json<JobResponse>> {
    let kind = parse_photo_kind(&body.kind)?;
    let job = state
        .job_service()
        .add_photo(&auth.user, &job_id, kind, &body.url)
        .await?;
    Ok(Json(job.into()))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/complete",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Job id")),
    request_body = CompleteJobBody,
    responses(
        (status = 200, description = "Job completed", body = JobResponse),
        (status = 400, description = "Invalid rate or missing photos", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Job is not in progress", body = ErrorResponse)
    )
)]
pub async fn complete_job(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
    body: Option<Json<CompleteJobBody>>,
) -> GatewayResult<Json<JobResponse>> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let job = state
        .job_service()
        .complete(&auth.user, &job_id, body.completion_rate, body.notes)
        .await?;
    Ok(Json(job.into()))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/cancel",
    tag = "Jobs",
    params(("job_id" = String, Path, description = "Job id")),
    request_body = CancelBody,
    responses(
        (status = 200, description = "Job cancelled", body = JobResponse),
        (status = 403, description = "Missing manage_jobs", body = ErrorResponse),
        (status = 409, description = "Job already finished", body = ErrorResponse)
    )
)]
pub async fn cancel_job(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> GatewayResult<Json<JobResponse>> {
    let reason = body.and_then(|Json(body)| body.reason);
    let job = state.job_service().cancel(&auth.user, &job_id, reason).await?;
    Ok(Json(job.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_kinds_parse() {
        assert_eq!(parse_photo_kind("before").unwrap(), PhotoKind::Before);
        assert_eq!(parse_photo_kind("after").unwrap(), PhotoKind::After);
        assert!(matches!(
            parse_photo_kind("during"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }
}
