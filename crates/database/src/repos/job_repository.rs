//! Job repository. Status writes are conditional on the status the caller
//! validated against, so a concurrent transition surfaces as a conflict.

use crate::entities::{CreateJobRequest, Job, JobFilter, JobStatus, JobStatusUpdate, PhotoKind};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const JOB_COLUMNS: &str = "id, public_id, building_id, worker_id, company_id, status, scheduled_at, started_at, completed_at, cancelled_at, cleaning_areas, before_photos, after_photos, completion_rate, notes, created_at, updated_at";

#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateJobRequest) -> DatabaseResult<Job> {
        let now = timestamp_now();
        let public_id = new_public_id();

        sqlx::query(
            r#"
            INSERT INTO jobs (
                public_id, building_id, worker_id, company_id, status, scheduled_at,
                cleaning_areas, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.building_id)
        .bind(&request.worker_id)
        .bind(&request.company_id)
        .bind(JobStatus::Scheduled.as_str())
        .bind(&request.scheduled_at)
        .bind(serde_json::to_string(&request.cleaning_areas)?)
        .bind(&request.notes)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.require(&public_id).await
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Job>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn require(&self, public_id: &str) -> DatabaseResult<Job> {
        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("job", public_id))
    }

    /// List jobs, most recently scheduled first.
    pub async fn list(&self, filter: &JobFilter, page: Page) -> DatabaseResult<Vec<Job>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE 1 = 1"));

        if let Some(worker_id) = &filter.worker_id {
            builder.push(" AND worker_id = ").push_bind(worker_id.clone());
        }
        if let Some(building_id) = &filter.building_id {
            builder.push(" AND building_id = ").push_bind(building_id.clone());
        }
        if let Some(company_id) = &filter.company_id {
            builder.push(" AND company_id = ").push_bind(company_id.clone());
        }
        if let Some(owner_id) = &filter.owner_id {
            builder
                .push(" AND building_id IN (SELECT public_id FROM buildings WHERE owner_id = ")
                .push_bind(owner_id.clone())
                .push(")");
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }

        builder
            .push(" ORDER BY scheduled_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(job_from_row).collect()
    }

    /// Append a photo URL to one of the job's photo sets. Fails with `Conflict`
    /// if the stored status is no longer `expected`.
    pub async fn add_photo(
        &self,
        public_id: &str,
        expected: JobStatus,
        kind: PhotoKind,
        url: &str,
    ) -> DatabaseResult<Job> {
        let column = kind.column();
        let query = format!(
            "UPDATE jobs SET {column} = json_insert({column}, '$[#]', ?), updated_at = ? \
             WHERE public_id = ? AND status = ?"
        );
        let result = sqlx::query(&query)
            .bind(url)
            .bind(timestamp_now())
            .bind(public_id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            let current = self.require(public_id).await?;
            return Err(DatabaseError::Conflict(format!(
                "job {public_id} is {} not {expected}",
                current.status
            )));
        }

        self.require(public_id).await
    }

    /// Move a job out of `expected`. Fails with `Conflict` if the stored status
    /// is no longer `expected`.
    pub async fn transition(
        &self,
        public_id: &str,
        expected: JobStatus,
        update: &JobStatusUpdate,
    ) -> DatabaseResult<Job> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE jobs SET status = ");
        builder
            .push_bind(update.status.as_str())
            .push(", updated_at = ")
            .push_bind(update.at.clone());

        if let Some(column) = stamp_column(update.status) {
            builder
                .push(format!(", {column} = "))
                .push_bind(update.at.clone());
        }
        if let Some(rate) = update.completion_rate {
            builder.push(", completion_rate = ").push_bind(rate);
        }
        if let Some(notes) = &update.notes {
            builder.push(", notes = ").push_bind(notes.clone());
        }

        builder
            .push(" WHERE public_id = ")
            .push_bind(public_id.to_string())
            .push(" AND status = ")
            .push_bind(expected.as_str());

        let result = builder.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            let current = self.require(public_id).await?;
            return Err(DatabaseError::Conflict(format!(
                "job {public_id} is {} not {expected}",
                current.status
            )));
        }

        self.require(public_id).await
    }

    /// Completed jobs for a worker, used for performance summaries.
    pub async fn count_completed_for_worker(&self, worker_id: &str) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE worker_id = ? AND status = 'completed'")
            .bind(worker_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn stamp_column(status: JobStatus) -> Option<&'static str> {
    match status {
        JobStatus::Scheduled => None,
        JobStatus::InProgress => Some("started_at"),
        JobStatus::Completed => Some("completed_at"),
        JobStatus::Cancelled => Some("cancelled_at"),
    }
}

fn job_from_row(row: &SqliteRow) -> DatabaseResult<Job> {
    let status: String = row.try_get("status")?;

    Ok(Job {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        building_id: row.try_get("building_id")?,
        worker_id: row.try_get("worker_id")?,
        company_id: row.try_get("company_id")?,
        status: status.parse().map_err(DatabaseError::SerializationError)?,
        scheduled_at: row.try_get("scheduled_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
        cleaning_areas: serde_json::from_str(&row.try_get::<String, _>("cleaning_areas")?)?,
        before_photos: serde_json::from_str(&row.try_get::<String, _>("before_photos")?)?,
        after_photos: serde_json::from_str(&row.try_get::<String, _>("after_photos")?)?,
        completion_rate: row.try_get("completion_rate")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
