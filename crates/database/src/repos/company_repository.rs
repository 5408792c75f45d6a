//! Company repository, including the company-plus-manager signup write.

use super::user_repository::insert_user;
use crate::entities::{Company, CreateCompanyRequest, CreateUserRequest, RoleProfile, User};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now, UserRepository};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

const COMPANY_COLUMNS: &str = "id, public_id, name, business_number, phone, address, is_active, worker_count, building_count, created_at, updated_at";

#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateCompanyRequest) -> DatabaseResult<Company> {
        let mut conn = self.pool.acquire().await?;
        let public_id = insert_company(&mut conn, request).await?;
        drop(conn);

        self.find_by_public_id(&public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("company", &public_id))
    }

    /// Create a company and its first manager atomically. The manager profile's
    /// company id is overwritten with the new company's id.
    pub async fn create_with_manager(
        &self,
        company: &CreateCompanyRequest,
        manager: &CreateUserRequest,
    ) -> DatabaseResult<(Company, User)> {
        let RoleProfile::Manager(profile) = &manager.profile else {
            return Err(DatabaseError::Conflict(format!(
                "company signup needs a manager profile, got {}",
                manager.profile.role()
            )));
        };

        let mut tx = self.pool.begin().await?;

        let company_id = insert_company(&mut tx, company).await?;

        let mut profile = profile.clone();
        profile.company_id = company_id.clone();
        let manager = CreateUserRequest {
            profile: RoleProfile::Manager(profile),
            ..manager.clone()
        };
        let user_id = insert_user(&mut tx, &manager).await?;

        tx.commit().await?;
        debug!(company_id = %company_id, manager_id = %user_id, "company created with manager");

        let company = self
            .find_by_public_id(&company_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("company", &company_id))?;
        let user = UserRepository::new(self.pool.clone())
            .find_by_public_id(&user_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", &user_id))?;

        Ok((company, user))
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Company>> {
        let query = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(company_from_row).transpose()
    }

    pub async fn list(&self, include_inactive: bool, page: Page) -> DatabaseResult<Vec<Company>> {
        let query = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE (? OR is_active = 1) ORDER BY name ASC, id ASC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&query)
            .bind(include_inactive)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(company_from_row).collect()
    }

    pub async fn set_active(&self, public_id: &str, is_active: bool) -> DatabaseResult<Company> {
        let result = sqlx::query("UPDATE companies SET is_active = ?, updated_at = ? WHERE public_id = ?")
            .bind(is_active)
            .bind(timestamp_now())
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("company", public_id));
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("company", public_id))
    }

    /// Recount active workers and active buildings attached to the company.
    pub async fn refresh_counters(&self, public_id: &str) -> DatabaseResult<Company> {
        let result = sqlx::query(
            r#"
            UPDATE companies SET
                worker_count = (
                    SELECT COUNT(*) FROM users
                    WHERE company_id = companies.public_id AND role = 'worker' AND is_active = 1
                ),
                building_count = (
                    SELECT COUNT(*) FROM buildings
                    WHERE company_id = companies.public_id AND is_active = 1
                ),
                updated_at = ?
            WHERE public_id = ?
            "#,
        )
        .bind(timestamp_now())
        .bind(public_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("company", public_id));
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("company", public_id))
    }
}

async fn insert_company(
    conn: &mut SqliteConnection,
    request: &CreateCompanyRequest,
) -> DatabaseResult<String> {
    let now = timestamp_now();
    let public_id = new_public_id();

    sqlx::query(
        r#"
        INSERT INTO companies (public_id, name, business_number, phone, address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&public_id)
    .bind(&request.name)
    .bind(&request.business_number)
    .bind(&request.phone)
    .bind(&request.address)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(public_id)
}

fn company_from_row(row: &SqliteRow) -> DatabaseResult<Company> {
    Ok(Company {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        name: row.try_get("name")?,
        business_number: row.try_get("business_number")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        is_active: row.try_get("is_active")?,
        worker_count: row.try_get("worker_count")?,
        building_count: row.try_get("building_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
