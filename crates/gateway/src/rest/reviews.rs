//! Review endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use cleanit_database::{Page, Review};
use cleanit_operations::{NewReview, RatingSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub job_id: String,
    pub client_id: String,
    pub worker_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.public_id,
            job_id: review.job_id,
            client_id: review.client_id,
            worker_id: review.worker_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingSummaryResponse {
    pub worker_id: String,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub completed_jobs: i64,
}

impl From<RatingSummary> for RatingSummaryResponse {
    fn from(summary: RatingSummary) -> Self {
        Self {
            worker_id: summary.worker_id,
            average_rating: summary.average_rating,
            review_count: summary.review_count,
            completed_jobs: summary.completed_jobs,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewBody {
    pub job_id: String,
    /// 1 to 5
    pub rating: i64,
    pub comment: Option<String>,
}

/// Exactly one of `job_id` or `worker_id` selects the reviews.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReviewsQuery {
    pub job_id: Option<String>,
    pub worker_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create review routes
pub fn create_review_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/reviews", get(list_reviews).post(create_review))
        .route("/api/workers/:worker_id/rating", get(worker_rating))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    tag = "Reviews",
    params(ListReviewsQuery),
    responses(
        (status = 200, description = "Reviews for the job or worker", body = Vec<ReviewResponse>),
        (status = 400, description = "Neither job_id nor worker_id given", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn list_reviews(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListReviewsQuery>,
) -> GatewayResult<Json<Vec<ReviewResponse>>> {
    let reviews = match (query.job_id, query.worker_id) {
        (Some(job_id), None) => state
            .review_service()
            .for_job(&auth.user, &job_id)
            .await?
            .into_iter()
            .collect::<Vec<_>>(),
        (None, Some(worker_id)) => {
            state
                .review_service()
                .for_worker(&auth.user, &worker_id, Page::new(query.limit, query.offset))
                .await?
        }
        _ => {
            return Err(GatewayError::InvalidRequest(
                "exactly one of job_id or worker_id is required".to_string(),
            ))
        }
    };

    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "Reviews",
    request_body = CreateReviewBody,
    responses(
        (status = 201, description = "Review posted", body = ReviewResponse),
        (status = 400, description = "Invalid rating or job not completed", body = ErrorResponse),
        (status = 403, description = "Not the building owner", body = ErrorResponse),
        (status = 409, description = "Job already reviewed", body = ErrorResponse)
    )
)]
pub async fn create_review(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateReviewBody>,
) -> GatewayResult<(StatusCode, Json<ReviewResponse>)> {
    let review = state
        .review_service()
        .create(
            &auth.user,
            NewReview {
                job_id: body.job_id,
                rating: body.rating,
                comment: body.comment,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

#[utoipa::path(
    get,
    path = "/api/workers/{worker_id}/rating",
    tag = "Reviews",
    params(("worker_id" = String, Path, description = "Worker id")),
    responses(
        (status = 200, description = "Average rating and completed jobs", body = RatingSummaryResponse),
        (status = 403, description = "Missing view_reports", body = ErrorResponse),
        (status = 404, description = "Worker not found", body = ErrorResponse)
    )
)]
pub async fn worker_rating(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(worker_id): Path<String>,
) -> GatewayResult<Json<RatingSummaryResponse>> {
    let summary = state
        .review_service()
        .worker_summary(&auth.user, &worker_id)
        .await?;
    Ok(Json(summary.into()))
}
