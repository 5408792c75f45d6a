//! Review repository.

use crate::entities::{CreateReviewRequest, Review};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const REVIEW_COLUMNS: &str = "id, public_id, job_id, client_id, worker_id, rating, comment, created_at";

#[derive(Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A job carries at most one review; a second one is a `Duplicate`.
    pub async fn create(&self, request: &CreateReviewRequest) -> DatabaseResult<Review> {
        let now = timestamp_now();
        let public_id = new_public_id();

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (public_id, job_id, client_id, worker_id, rating, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.job_id)
        .bind(&request.client_id)
        .bind(&request.worker_id)
        .bind(request.rating)
        .bind(&request.comment)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Review {
            id: result.last_insert_rowid(),
            public_id,
            job_id: request.job_id.clone(),
            client_id: request.client_id.clone(),
            worker_id: request.worker_id.clone(),
            rating: request.rating,
            comment: request.comment.clone(),
            created_at: now,
        })
    }

    pub async fn find_by_job(&self, job_id: &str) -> DatabaseResult<Option<Review>> {
        let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE job_id = ?");
        let row = sqlx::query(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    pub async fn list_for_worker(&self, worker_id: &str, page: Page) -> DatabaseResult<Vec<Review>> {
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE worker_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&query)
            .bind(worker_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(review_from_row).collect()
    }

    /// Average rating and review count for a worker.
    pub async fn rating_summary(&self, worker_id: &str) -> DatabaseResult<(Option<f64>, i64)> {
        let row = sqlx::query("SELECT AVG(rating) AS average, COUNT(*) AS count FROM reviews WHERE worker_id = ?")
            .bind(worker_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((row.try_get("average")?, row.try_get("count")?))
    }
}

fn review_from_row(row: &SqliteRow) -> DatabaseResult<Review> {
    Ok(Review {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        job_id: row.try_get("job_id")?,
        client_id: row.try_get("client_id")?,
        worker_id: row.try_get("worker_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}
