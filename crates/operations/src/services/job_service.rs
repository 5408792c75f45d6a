//! Job scheduling and the worker-facing job lifecycle.

use chrono::{DateTime, SecondsFormat, Utc};
use cleanit_config::JobsConfig;
use cleanit_database::{
    timestamp_now, Building, BuildingRepository, CreateJobRequest, Job, JobFilter, JobRepository,
    JobStatus, Page, PhotoKind, Role, SqlitePool, User, UserRepository,
};
use cleanit_users::utils::validation::{validate_text, validate_url};
use cleanit_users::Permission;
use tracing::{info, warn};

use super::access::{job_visible, manager_company, require, require_any};
use crate::lifecycle::{plan_job_transition, JobTransition};
use crate::types::{DomainEvent, EventBus, NewJob, OperationError, OperationResult};

const NOTES_MAX_CHARS: usize = 1000;

#[derive(Clone)]
pub struct JobService {
    jobs: JobRepository,
    buildings: BuildingRepository,
    users: UserRepository,
    events: EventBus,
    require_photos: bool,
}

impl JobService {
    pub fn new(pool: SqlitePool, config: &JobsConfig, events: EventBus) -> Self {
        Self {
            jobs: JobRepository::new(pool.clone()),
            buildings: BuildingRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            events,
            require_photos: config.require_photos_for_completion,
        }
    }

    /// Schedule a job at an active building for an active worker. Managers can
    /// only schedule their own company's workers at their company's buildings.
    pub async fn create(&self, actor: &User, input: NewJob) -> OperationResult<Job> {
        require(actor, Permission::ManageJobs)?;

        let building = self.require_building(&input.building_id).await?;
        if !building.is_active {
            return Err(OperationError::validation("building is inactive"));
        }

        let worker = self
            .users
            .find_by_public_id(&input.worker_id)
            .await?
            .ok_or_else(|| OperationError::not_found("user", &input.worker_id))?;
        if worker.role() != Role::Worker || !worker.is_active {
            return Err(OperationError::validation("jobs can only be assigned to active workers"));
        }

        let company_id = if actor.role() == Role::Manager {
            let company_id = manager_company(actor)?;
            if building.company_id.as_deref() != Some(company_id.as_str()) {
                return Err(OperationError::permission_denied("building is not serviced by your company"));
            }
            if worker.company_id() != Some(company_id.as_str()) {
                return Err(OperationError::validation("worker belongs to another company"));
            }
            Some(company_id)
        } else {
            building.company_id.clone()
        };

        let scheduled_at = parse_timestamp("scheduled_at", &input.scheduled_at)?;

        let cleaning_areas = input
            .cleaning_areas
            .unwrap_or_else(|| building.cleaning_areas.clone());
        for area in &cleaning_areas {
            validate_text("cleaning area", area, 50)?;
        }
        if let Some(notes) = input.notes.as_deref() {
            validate_notes(notes)?;
        }

        let job = self
            .jobs
            .create(&CreateJobRequest {
                building_id: building.public_id.clone(),
                worker_id: worker.public_id.clone(),
                company_id,
                scheduled_at,
                cleaning_areas,
                notes: input.notes,
            })
            .await?;

        info!(
            actor = %actor.public_id,
            job = %job.public_id,
            building = %job.building_id,
            worker = %job.worker_id,
            scheduled_at = %job.scheduled_at,
            "job scheduled"
        );

        self.events.publish(
            DomainEvent::JobScheduled {
                job_id: job.public_id.clone(),
                building_id: job.building_id.clone(),
            },
            vec![job.worker_id.clone(), building.owner_id.clone()],
            job.company_id.clone(),
        );

        Ok(job)
    }

    pub async fn get(&self, actor: &User, public_id: &str) -> OperationResult<Job> {
        require_any(
            actor,
            &[
                Permission::ManageJobs,
                Permission::ViewAssignedJobs,
                Permission::ViewJobReports,
            ],
        )?;

        let job = self.require_job(public_id).await?;
        let building = self.require_building(&job.building_id).await?;
        if !job_visible(actor, &job, &building.owner_id) {
            return Err(OperationError::permission_denied("job belongs to someone else"));
        }

        Ok(job)
    }

    pub async fn list(&self, actor: &User, filter: JobFilter, page: Page) -> OperationResult<Vec<Job>> {
        require_any(
            actor,
            &[
                Permission::ManageJobs,
                Permission::ViewAssignedJobs,
                Permission::ViewJobReports,
            ],
        )?;

        let mut filter = filter;
        match actor.role() {
            Role::Admin => {}
            Role::Manager => filter.company_id = Some(manager_company(actor)?),
            Role::Worker => filter.worker_id = Some(actor.public_id.clone()),
            Role::Client => filter.owner_id = Some(actor.public_id.clone()),
        }

        Ok(self.jobs.list(&filter, page).await?)
    }

    pub async fn start(&self, actor: &User, public_id: &str) -> OperationResult<Job> {
        require(actor, Permission::UpdateJobStatus)?;

        let job = self.require_job(public_id).await?;
        self.require_operator(actor, &job)?;

        self.apply(actor, job, JobTransition::Start).await
    }

    /// Finish a job. With the photo rule on, both photo sets must be present.
    pub async fn complete(
        &self,
        actor: &User,
        public_id: &str,
        completion_rate: Option<f64>,
        notes: Option<String>,
    ) -> OperationResult<Job> {
        require(actor, Permission::UpdateJobStatus)?;

        let job = self.require_job(public_id).await?;
        self.require_operator(actor, &job)?;

        if let Some(rate) = completion_rate {
            if !(0.0..=100.0).contains(&rate) {
                return Err(OperationError::validation("completion_rate must be between 0 and 100"));
            }
        }
        if let Some(notes) = notes.as_deref() {
            validate_notes(notes)?;
        }

        if self.require_photos && (job.before_photos.is_empty() || job.after_photos.is_empty()) {
            return Err(OperationError::validation(
                "before and after photos are required to complete a job",
            ));
        }

        self.apply(
            actor,
            job,
            JobTransition::Complete {
                completion_rate,
                notes,
            },
        )
        .await
    }

    pub async fn cancel(
        &self,
        actor: &User,
        public_id: &str,
        reason: Option<String>,
    ) -> OperationResult<Job> {
        require(actor, Permission::ManageJobs)?;

        let job = self.require_job(public_id).await?;
        self.require_operator(actor, &job)?;
        if let Some(reason) = reason.as_deref() {
            validate_notes(reason)?;
        }

        self.apply(actor, job, JobTransition::Cancel { reason }).await
    }

    /// Attach a photo to the job. Photos live under `jobs/{job_id}/{before|after}/`.
    /// Before photos are accepted until the job finishes, after photos only
    /// while it is in progress.
    pub async fn add_photo(
        &self,
        actor: &User,
        public_id: &str,
        kind: PhotoKind,
        url: &str,
    ) -> OperationResult<Job> {
        require(actor, Permission::UploadJobPhotos)?;

        let job = self.require_job(public_id).await?;
        if job.worker_id != actor.public_id {
            return Err(OperationError::permission_denied("job is assigned to another worker"));
        }

        let accepting = match kind {
            PhotoKind::Before => matches!(job.status, JobStatus::Scheduled | JobStatus::InProgress),
            PhotoKind::After => job.status == JobStatus::InProgress,
        };
        if !accepting {
            return Err(OperationError::validation(format!(
                "{} photos cannot be added while the job is {}",
                kind.as_str(),
                job.status
            )));
        }

        validate_url(url)?;
        let scope = photo_scope(&job.public_id, kind);
        if !url.contains(&scope) {
            return Err(OperationError::validation(format!("photo must be stored under {scope}")));
        }

        let job = self.jobs.add_photo(public_id, job.status, kind, url).await?;
        info!(job = %job.public_id, kind = kind.as_str(), "job photo added");

        self.events.publish(
            DomainEvent::JobPhotoAdded {
                job_id: job.public_id.clone(),
                kind,
                url: url.to_string(),
            },
            vec![job.worker_id.clone()],
            job.company_id.clone(),
        );

        Ok(job)
    }

    async fn apply(&self, actor: &User, job: Job, transition: JobTransition) -> OperationResult<Job> {
        let from = job.status;
        let update = plan_job_transition(from, transition, &timestamp_now())?;

        let job = self
            .jobs
            .transition(&job.public_id, from, &update)
            .await
            .map_err(|error| {
                warn!(job = %job.public_id, from = %from, to = %update.status, %error, "job transition rejected");
                OperationError::from(error)
            })?;

        info!(actor = %actor.public_id, job = %job.public_id, from = %from, to = %job.status, "job status changed");

        let building = self.require_building(&job.building_id).await?;
        self.events.publish(
            DomainEvent::JobStatusChanged {
                job_id: job.public_id.clone(),
                from,
                to: job.status,
            },
            vec![job.worker_id.clone(), building.owner_id],
            job.company_id.clone(),
        );

        Ok(job)
    }

    /// Workers operate their own jobs, managers their company's.
    fn require_operator(&self, actor: &User, job: &Job) -> OperationResult<()> {
        let allowed = match actor.role() {
            Role::Admin => true,
            Role::Manager => {
                let company_id = manager_company(actor)?;
                job.company_id.as_deref() == Some(company_id.as_str())
            }
            Role::Worker => job.worker_id == actor.public_id,
            Role::Client => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(OperationError::permission_denied("job belongs to someone else"))
        }
    }

    async fn require_job(&self, public_id: &str) -> OperationResult<Job> {
        self.jobs
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("job", public_id))
    }

    async fn require_building(&self, public_id: &str) -> OperationResult<Building> {
        self.buildings
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("building", public_id))
    }
}

/// Storage path prefix for a job's photo set.
pub fn photo_scope(job_id: &str, kind: PhotoKind) -> String {
    format!("jobs/{job_id}/{}/", kind.as_str())
}

/// Parse an RFC 3339 timestamp into the stored UTC form.
pub(crate) fn parse_timestamp(field: &str, value: &str) -> OperationResult<String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true))
        .map_err(|_| OperationError::validation(format!("{field} must be an RFC 3339 timestamp")))
}

fn validate_notes(notes: &str) -> OperationResult<()> {
    if notes.chars().count() > NOTES_MAX_CHARS {
        return Err(OperationError::validation(format!(
            "notes must be at most {NOTES_MAX_CHARS} characters long"
        )));
    }
    Ok(())
}
