//! Client reviews of completed jobs.

use cleanit_database::{
    BuildingRepository, CreateReviewRequest, DatabaseError, JobRepository, JobStatus, Page,
    Review, ReviewRepository, Role, SqlitePool, User, UserRepository,
};
use cleanit_users::utils::validation::validate_text;
use cleanit_users::Permission;
use tracing::info;

use super::access::{job_visible, manager_company, require};
use crate::types::{DomainEvent, EventBus, NewReview, OperationError, OperationResult, RatingSummary};

#[derive(Clone)]
pub struct ReviewService {
    reviews: ReviewRepository,
    jobs: JobRepository,
    buildings: BuildingRepository,
    users: UserRepository,
    events: EventBus,
}

impl ReviewService {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self {
            reviews: ReviewRepository::new(pool.clone()),
            jobs: JobRepository::new(pool.clone()),
            buildings: BuildingRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            events,
        }
    }

    /// One review per completed job, written by the owner of the job's building.
    pub async fn create(&self, actor: &User, input: NewReview) -> OperationResult<Review> {
        require(actor, Permission::WriteReviews)?;

        if !(1..=5).contains(&input.rating) {
            return Err(OperationError::validation("rating must be between 1 and 5"));
        }
        if let Some(comment) = input.comment.as_deref() {
            validate_text("comment", comment, 1000)?;
        }

        let job = self
            .jobs
            .find_by_public_id(&input.job_id)
            .await?
            .ok_or_else(|| OperationError::not_found("job", &input.job_id))?;
        let building = self
            .buildings
            .find_by_public_id(&job.building_id)
            .await?
            .ok_or_else(|| OperationError::not_found("building", &job.building_id))?;

        if building.owner_id != actor.public_id {
            return Err(OperationError::permission_denied("only the building owner can review this job"));
        }
        if job.status != JobStatus::Completed {
            return Err(OperationError::validation("only completed jobs can be reviewed"));
        }

        let review = self
            .reviews
            .create(&CreateReviewRequest {
                job_id: job.public_id.clone(),
                client_id: actor.public_id.clone(),
                worker_id: job.worker_id.clone(),
                rating: input.rating,
                comment: input.comment,
            })
            .await
            .map_err(|error| match error {
                DatabaseError::Duplicate(_) => OperationError::Conflict {
                    message: format!("job {} has already been reviewed", job.public_id),
                },
                other => OperationError::from(other),
            })?;

        info!(client = %actor.public_id, job = %review.job_id, rating = review.rating, "review posted");

        self.events.publish(
            DomainEvent::ReviewPosted {
                job_id: review.job_id.clone(),
                review_id: review.public_id.clone(),
                rating: review.rating,
            },
            vec![review.worker_id.clone(), review.client_id.clone()],
            job.company_id.clone(),
        );

        Ok(review)
    }

    pub async fn for_job(&self, actor: &User, job_id: &str) -> OperationResult<Option<Review>> {
        require(actor, Permission::ViewJobReports)?;

        let job = self
            .jobs
            .find_by_public_id(job_id)
            .await?
            .ok_or_else(|| OperationError::not_found("job", job_id))?;
        let building = self
            .buildings
            .find_by_public_id(&job.building_id)
            .await?
            .ok_or_else(|| OperationError::not_found("building", &job.building_id))?;
        if !job_visible(actor, &job, &building.owner_id) {
            return Err(OperationError::permission_denied("job belongs to someone else"));
        }

        Ok(self.reviews.find_by_job(job_id).await?)
    }

    pub async fn for_worker(&self, actor: &User, worker_id: &str, page: Page) -> OperationResult<Vec<Review>> {
        self.require_worker_access(actor, worker_id).await?;
        Ok(self.reviews.list_for_worker(worker_id, page).await?)
    }

    pub async fn worker_summary(&self, actor: &User, worker_id: &str) -> OperationResult<RatingSummary> {
        self.require_worker_access(actor, worker_id).await?;

        let (average_rating, review_count) = self.reviews.rating_summary(worker_id).await?;
        let completed_jobs = self.jobs.count_completed_for_worker(worker_id).await?;

        Ok(RatingSummary {
            worker_id: worker_id.to_string(),
            average_rating,
            review_count,
            completed_jobs,
        })
    }

    /// Managers report on their own company's workers.
    async fn require_worker_access(&self, actor: &User, worker_id: &str) -> OperationResult<()> {
        require(actor, Permission::ViewReports)?;

        let worker = self
            .users
            .find_by_public_id(worker_id)
            .await?
            .ok_or_else(|| OperationError::not_found("user", worker_id))?;
        if worker.role() != Role::Worker {
            return Err(OperationError::validation("user is not a worker"));
        }

        if actor.role() == Role::Manager && worker.company_id() != Some(manager_company(actor)?.as_str()) {
            return Err(OperationError::permission_denied("worker belongs to another company"));
        }

        Ok(())
    }
}
