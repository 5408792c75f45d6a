//! User repository for database operations.

use crate::entities::{CreateUserRequest, Role, RoleProfile, UpdateUserRequest, User, UserFilter};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

const USER_COLUMNS: &str = "id, public_id, login_id, account_email, name, phone, contact_email, address, role, profile, is_active, is_verified, last_login_at, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_login_id(&self, login_id: &str) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE login_id = ?");
        let row = sqlx::query(&query)
            .bind(login_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Look up an account by its synthesized email, returning the stored password hash too.
    pub async fn find_credentials(&self, account_email: &str) -> DatabaseResult<Option<(User, String)>> {
        let query = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE account_email = ?");
        let row = sqlx::query(&query)
            .bind(account_email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let user = user_from_row(&row)?;
                let hash: String = row.try_get("password_hash")?;
                Ok(Some((user, hash)))
            }
            None => Ok(None),
        }
    }

    pub async fn login_id_exists(&self, login_id: &str) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE login_id = ?")
            .bind(login_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    pub async fn create(&self, request: &CreateUserRequest) -> DatabaseResult<User> {
        let mut conn = self.pool.acquire().await?;
        let public_id = insert_user(&mut conn, request).await?;
        drop(conn);

        self.find_by_public_id(&public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", &public_id))
    }

    /// Update contact fields and, when given, the profile. The profile must keep its role.
    pub async fn update(&self, public_id: &str, request: &UpdateUserRequest) -> DatabaseResult<User> {
        let existing = self
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", public_id))?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = ");
        builder.push_bind(timestamp_now());

        if let Some(name) = &request.name {
            builder.push(", name = ").push_bind(name.clone());
        }
        if let Some(phone) = &request.phone {
            builder.push(", phone = ").push_bind(phone.clone());
        }
        if let Some(contact_email) = &request.contact_email {
            builder.push(", contact_email = ").push_bind(contact_email.clone());
        }
        if let Some(address) = &request.address {
            builder.push(", address = ").push_bind(address.clone());
        }
        if let Some(profile) = &request.profile {
            if profile.role() != existing.role() {
                return Err(DatabaseError::Conflict(format!(
                    "profile for role {} cannot replace role {}",
                    profile.role(),
                    existing.role()
                )));
            }
            builder
                .push(", profile = ")
                .push_bind(serde_json::to_string(profile)?)
                .push(", company_id = ")
                .push_bind(profile.company_id().filter(|id| !id.is_empty()).map(str::to_string));
        }

        builder.push(" WHERE public_id = ").push_bind(public_id.to_string());
        builder.build().execute(&self.pool).await?;

        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", public_id))
    }

    pub async fn set_active(&self, public_id: &str, is_active: bool) -> DatabaseResult<User> {
        self.set_flag(public_id, "is_active", is_active).await
    }

    pub async fn set_verified(&self, public_id: &str, is_verified: bool) -> DatabaseResult<User> {
        self.set_flag(public_id, "is_verified", is_verified).await
    }

    async fn set_flag(&self, public_id: &str, column: &'static str, value: bool) -> DatabaseResult<User> {
        let query = format!("UPDATE users SET {column} = ?, updated_at = ? WHERE public_id = ?");
        let result = sqlx::query(&query)
            .bind(value)
            .bind(timestamp_now())
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("user", public_id));
        }

        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", public_id))
    }

    pub async fn update_last_login(&self, id: i64) -> DatabaseResult<()> {
        let now = timestamp_now();
        let result = sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("user", id));
        }

        Ok(())
    }

    pub async fn list(&self, filter: &UserFilter, page: Page) -> DatabaseResult<Vec<User>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));

        if let Some(role) = filter.role {
            builder.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(company_id) = &filter.company_id {
            builder.push(" AND company_id = ").push_bind(company_id.clone());
        }
        if let Some(is_active) = filter.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    pub async fn count_by_role(&self) -> DatabaseResult<Vec<(Role, i64)>> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let role: String = row.try_get("role")?;
                let role = role
                    .parse::<Role>()
                    .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
                Ok((role, row.try_get("count")?))
            })
            .collect()
    }
}

/// Insert a user on an existing connection so callers can group it with other writes.
pub(crate) async fn insert_user(
    conn: &mut SqliteConnection,
    request: &CreateUserRequest,
) -> DatabaseResult<String> {
    let now = timestamp_now();
    let public_id = new_public_id();
    let profile = serde_json::to_string(&request.profile)?;
    let company_id = request
        .profile
        .company_id()
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    sqlx::query(
        r#"
        INSERT INTO users (
            public_id, login_id, account_email, password_hash, name, phone, contact_email,
            address, role, profile, company_id, is_active, is_verified, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(&public_id)
    .bind(&request.login_id)
    .bind(&request.account_email)
    .bind(&request.password_hash)
    .bind(&request.name)
    .bind(&request.phone)
    .bind(&request.contact_email)
    .bind(&request.address)
    .bind(request.profile.role().as_str())
    .bind(profile)
    .bind(company_id)
    .bind(request.is_verified)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(public_id)
}

fn user_from_row(row: &SqliteRow) -> DatabaseResult<User> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
    let profile: RoleProfile = serde_json::from_str(&row.try_get::<String, _>("profile")?)?;

    if profile.role() != role {
        return Err(DatabaseError::SerializationError(format!(
            "stored profile for role {} does not match role {}",
            profile.role(),
            role
        )));
    }

    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        login_id: row.try_get("login_id")?,
        account_email: row.try_get("account_email")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        contact_email: row.try_get("contact_email")?,
        address: row.try_get("address")?,
        profile,
        is_active: row.try_get("is_active")?,
        is_verified: row.try_get("is_verified")?,
        last_login_at: row.try_get("last_login_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ClientProfile, WorkerProfile};
    use crate::initialize_in_memory;

    pub(crate) fn client_request(login_id: &str) -> CreateUserRequest {
        CreateUserRequest {
            login_id: login_id.to_string(),
            account_email: format!("{login_id}@cleanit.temp"),
            password_hash: "hash".to_string(),
            name: format!("Client {login_id}"),
            phone: Some("010-0000-0000".to_string()),
            contact_email: None,
            address: None,
            profile: RoleProfile::Client(ClientProfile::default()),
            is_verified: false,
        }
    }

    #[tokio::test]
    async fn test_user_creation_and_retrieval() {
        let repo = UserRepository::new(initialize_in_memory().await.unwrap());

        let created = repo.create(&client_request("alice")).await.unwrap();
        assert_eq!(created.role(), Role::Client);
        assert_eq!(created.account_email, "alice@cleanit.temp");
        assert!(created.is_active);
        assert!(!created.is_verified);

        let found = repo.find_by_login_id("alice").await.unwrap().unwrap();
        assert_eq!(found, created);

        let (_, hash) = repo.find_credentials("alice@cleanit.temp").await.unwrap().unwrap();
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_login_id_is_reported() {
        let repo = UserRepository::new(initialize_in_memory().await.unwrap());

        repo.create(&client_request("bob")).await.unwrap();
        let error = repo.create(&client_request("bob")).await.unwrap_err();
        assert!(matches!(error, DatabaseError::Duplicate(_)));
        assert!(repo.login_id_exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_update_cannot_change_role() {
        let repo = UserRepository::new(initialize_in_memory().await.unwrap());
        let user = repo.create(&client_request("carol")).await.unwrap();

        let request = UpdateUserRequest {
            profile: Some(RoleProfile::Worker(WorkerProfile::default())),
            ..Default::default()
        };
        let error = repo.update(&user.public_id, &request).await.unwrap_err();
        assert!(matches!(error, DatabaseError::Conflict(_)));

        let request = UpdateUserRequest {
            phone: Some("010-1234-5678".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&user.public_id, &request).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("010-1234-5678"));
        assert_eq!(updated.name, user.name);
    }

    #[tokio::test]
    async fn test_flags_and_filters() {
        let repo = UserRepository::new(initialize_in_memory().await.unwrap());
        let user = repo.create(&client_request("dave")).await.unwrap();
        repo.create(&client_request("erin")).await.unwrap();

        let verified = repo.set_verified(&user.public_id, true).await.unwrap();
        assert!(verified.is_verified);

        let inactive = repo.set_active(&user.public_id, false).await.unwrap();
        assert!(!inactive.is_active);

        let active = repo
            .list(
                &UserFilter {
                    is_active: Some(true),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].login_id, "erin");

        let counts = repo.count_by_role().await.unwrap();
        assert_eq!(counts, vec![(Role::Client, 2)]);

        assert!(matches!(
            repo.set_active("missing", true).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let repo = UserRepository::new(initialize_in_memory().await.unwrap());
        let user = repo.create(&client_request("frank")).await.unwrap();
        assert!(user.last_login_at.is_none());

        repo.update_last_login(user.id).await.unwrap();

        let updated = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(updated.last_login_at.is_some());
    }
}
