//! Service request repository. Status writes are conditional on the status the
//! caller validated against.

use crate::entities::{
    CreateServiceRequest, RequestFilter, RequestStatus, RequestStatusUpdate, ServiceRequest,
};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const REQUEST_COLUMNS: &str = "id, public_id, client_id, building_id, request_type, priority, title, description, photos, status, assigned_to, approved_by_admin, response, cancel_reason, assigned_at, started_at, completed_at, cancelled_at, created_at, updated_at";

#[derive(Clone)]
pub struct RequestRepository {
    pool: SqlitePool,
}

impl RequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateServiceRequest) -> DatabaseResult<ServiceRequest> {
        let now = timestamp_now();
        let public_id = new_public_id();

        sqlx::query(
            r#"
            INSERT INTO requests (
                public_id, client_id, building_id, request_type, priority, title, description,
                photos, status, approved_by_admin, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.client_id)
        .bind(&request.building_id)
        .bind(request.request_type.as_str())
        .bind(request.priority.as_str())
        .bind(&request.title)
        .bind(&request.description)
        .bind(serde_json::to_string(&request.photos)?)
        .bind(RequestStatus::Pending.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.require(&public_id).await
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<ServiceRequest>> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn require(&self, public_id: &str) -> DatabaseResult<ServiceRequest> {
        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("request", public_id))
    }

    /// List requests, newest first.
    pub async fn list(&self, filter: &RequestFilter, page: Page) -> DatabaseResult<Vec<ServiceRequest>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE 1 = 1"));

        if let Some(client_id) = &filter.client_id {
            builder.push(" AND client_id = ").push_bind(client_id.clone());
        }
        if let Some(building_id) = &filter.building_id {
            builder.push(" AND building_id = ").push_bind(building_id.clone());
        }
        if let Some(worker_id) = &filter.assigned_worker_id {
            builder
                .push(" AND json_extract(assigned_to, '$.worker_id') = ")
                .push_bind(worker_id.clone());
        }
        if let Some(company_id) = &filter.assigned_company_id {
            builder
                .push(" AND json_extract(assigned_to, '$.company_id') = ")
                .push_bind(company_id.clone());
        }
        if let Some(company_id) = &filter.company_scope {
            builder
                .push(" AND (building_id IN (SELECT public_id FROM buildings WHERE company_id = ")
                .push_bind(company_id.clone())
                .push(") OR json_extract(assigned_to, '$.company_id') = ")
                .push_bind(company_id.clone())
                .push(")");
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(request_from_row).collect()
    }

    /// Move a request out of `expected`, writing only the fields present in
    /// `update` plus the timestamp column of the new status.
    pub async fn transition(
        &self,
        public_id: &str,
        expected: RequestStatus,
        update: &RequestStatusUpdate,
    ) -> DatabaseResult<ServiceRequest> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE requests SET status = ");
        builder
            .push_bind(update.status.as_str())
            .push(", updated_at = ")
            .push_bind(update.at.clone());

        if let Some(column) = stamp_column(update.status) {
            builder
                .push(format!(", {column} = "))
                .push_bind(update.at.clone());
        }
        if let Some(approved) = update.approved_by_admin {
            builder.push(", approved_by_admin = ").push_bind(approved);
        }
        if let Some(assignment) = &update.assigned_to {
            builder
                .push(", assigned_to = ")
                .push_bind(serde_json::to_string(assignment)?);
        }
        if let Some(response) = &update.response {
            builder
                .push(", response = ")
                .push_bind(serde_json::to_string(response)?);
        }
        if let Some(reason) = &update.cancel_reason {
            builder.push(", cancel_reason = ").push_bind(reason.clone());
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
                "request {public_id} is {} not {expected}",
                current.status
            )));
        }

        self.require(public_id).await
    }

    pub async fn count_by_status(&self) -> DatabaseResult<Vec<(RequestStatus, i64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM requests GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok((
                    status.parse().map_err(DatabaseError::SerializationError)?,
                    row.try_get("count")?,
                ))
            })
            .collect()
    }
}

fn stamp_column(status: RequestStatus) -> Option<&'static str> {
    match status {
        RequestStatus::Pending => None,
        RequestStatus::Assigned => Some("assigned_at"),
        RequestStatus::InProgress => Some("started_at"),
        RequestStatus::Completed => Some("completed_at"),
        RequestStatus::Cancelled => Some("cancelled_at"),
    }
}

fn request_from_row(row: &SqliteRow) -> DatabaseResult<ServiceRequest> {
    let request_type: String = row.try_get("request_type")?;
    let priority: String = row.try_get("priority")?;
    let status: String = row.try_get("status")?;
    let assigned_to: Option<String> = row.try_get("assigned_to")?;
    let response: Option<String> = row.try_get("response")?;

    Ok(ServiceRequest {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        client_id: row.try_get("client_id")?,
        building_id: row.try_get("building_id")?,
        request_type: request_type.parse().map_err(DatabaseError::SerializationError)?,
        priority: priority.parse().map_err(DatabaseError::SerializationError)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        photos: serde_json::from_str(&row.try_get::<String, _>("photos")?)?,
        status: status.parse().map_err(DatabaseError::SerializationError)?,
        assigned_to: assigned_to.as_deref().map(serde_json::from_str).transpose()?,
        approved_by_admin: row.try_get("approved_by_admin")?,
        response: response.as_deref().map(serde_json::from_str).transpose()?,
        cancel_reason: row.try_get("cancel_reason")?,
        assigned_at: row.try_get("assigned_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Assignment, RequestPriority, RequestResponse, RequestType};
    use crate::initialize_in_memory;
    use crate::repos::job_repository::tests::seed;

    fn create_request(client_id: &str, building_id: &str) -> CreateServiceRequest {
        CreateServiceRequest {
            client_id: client_id.to_string(),
            building_id: building_id.to_string(),
            request_type: RequestType::Complaint,
            priority: RequestPriority::High,
            title: "Lobby floor sticky".to_string(),
            description: "Please re-mop the lobby".to_string(),
            photos: vec![],
        }
    }

    fn update(status: RequestStatus) -> RequestStatusUpdate {
        RequestStatusUpdate {
            status,
            at: timestamp_now(),
            approved_by_admin: None,
            assigned_to: None,
            response: None,
            cancel_reason: None,
        }
    }

    #[tokio::test]
    async fn test_new_request_is_pending() {
        let pool = initialize_in_memory().await.unwrap();
        let seeded = seed(&pool).await;
        let repo = RequestRepository::new(pool);

        let request = repo
            .create(&create_request(&seeded.owner_id, &seeded.building_id))
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(!request.approved_by_admin);
        assert!(request.assigned_to.is_none());
        assert!(request.response.is_none());
    }

    #[tokio::test]
    async fn test_assignment_writes_only_given_fields() {
        let pool = initialize_in_memory().await.unwrap();
        let seeded = seed(&pool).await;
        let repo = RequestRepository::new(pool);
        let request = repo
            .create(&create_request(&seeded.owner_id, &seeded.building_id))
            .await
            .unwrap();

        let assigned = repo
            .transition(
                &request.public_id,
                RequestStatus::Pending,
                &RequestStatusUpdate {
                    approved_by_admin: Some(true),
                    assigned_to: Some(Assignment {
                        admin_id: Some("admin".to_string()),
                        worker_id: Some(seeded.worker_id.clone()),
                        company_id: None,
                    }),
                    ..update(RequestStatus::Assigned)
                },
            )
            .await
            .unwrap();

        assert_eq!(assigned.status, RequestStatus::Assigned);
        assert!(assigned.approved_by_admin);
        assert!(assigned.assigned_at.is_some());
        assert!(assigned.started_at.is_none());
        assert_eq!(assigned.title, request.title);

        let for_worker = repo
            .list(
                &RequestFilter {
                    assigned_worker_id: Some(seeded.worker_id.clone()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(for_worker.len(), 1);

        let started = repo
            .transition(&request.public_id, RequestStatus::Assigned, &update(RequestStatus::InProgress))
            .await
            .unwrap();
        assert!(started.approved_by_admin);
        assert_eq!(started.assigned_to, assigned.assigned_to);

        let completed = repo
            .transition(
                &request.public_id,
                RequestStatus::InProgress,
                &RequestStatusUpdate {
                    response: Some(RequestResponse {
                        notes: Some("re-mopped".to_string()),
                        photos: vec![],
                        completed_at: None,
                    }),
                    ..update(RequestStatus::Completed)
                },
            )
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());
        assert_eq!(
            completed.response.and_then(|response| response.notes).as_deref(),
            Some("re-mopped")
        );
    }

    #[tokio::test]
    async fn test_stale_transition_conflicts() {
        let pool = initialize_in_memory().await.unwrap();
        let seeded = seed(&pool).await;
        let repo = RequestRepository::new(pool);
        let request = repo
            .create(&create_request(&seeded.owner_id, &seeded.building_id))
            .await
            .unwrap();

        repo.transition(
            &request.public_id,
            RequestStatus::Pending,
            &RequestStatusUpdate {
                cancel_reason: Some("no longer needed".to_string()),
                ..update(RequestStatus::Cancelled)
            },
        )
        .await
        .unwrap();

        let error = repo
            .transition(&request.public_id, RequestStatus::Pending, &update(RequestStatus::Assigned))
            .await
            .unwrap_err();
        assert!(matches!(error, DatabaseError::Conflict(_)));

        let counts = repo.count_by_status().await.unwrap();
        assert_eq!(counts, vec![(RequestStatus::Cancelled, 1)]);
    }
}
