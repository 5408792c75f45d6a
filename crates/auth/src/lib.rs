use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use cleanit_config::AuthConfig;
use cleanit_database::{
    CreateUserRequest, DatabaseError, RoleProfile, SessionRepository, SqlitePool, User,
    UserRepository,
};
use rand::RngCore;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Authenticator {
    users: UserRepository,
    sessions: SessionRepository,
    session_ttl: Duration,
    email_domain: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login id is already in use")]
    LoginIdTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is deactivated")]
    AccountInactive,
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(error: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(error)
    }
}

/// A bearer token and its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Everything needed to open a password account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login_id: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub profile: RoleProfile,
    pub is_verified: bool,
}

impl NewAccount {
    pub fn into_user_request(self, account_email: String, password_hash: String) -> CreateUserRequest {
        CreateUserRequest {
            login_id: self.login_id,
            account_email,
            password_hash,
            name: self.name,
            phone: self.phone,
            contact_email: self.contact_email,
            address: self.address,
            profile: self.profile,
            is_verified: self.is_verified,
        }
    }
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            session_ttl: Duration::seconds(config.session_ttl_seconds as i64),
            email_domain: config.account_email_domain.clone(),
        }
    }

    /// The account email an id/password account is keyed by.
    pub fn account_email(&self, login_id: &str) -> String {
        format!("{}@{}", login_id.trim().to_lowercase(), self.email_domain)
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Check the login id is free and hash the password, producing the row to
    /// insert. Used directly when the account is written inside a larger transaction.
    pub async fn prepare_account(&self, account: NewAccount) -> Result<CreateUserRequest, AuthError> {
        if self.users.login_id_exists(&account.login_id).await? {
            return Err(AuthError::LoginIdTaken);
        }

        let account_email = self.account_email(&account.login_id);
        let password_hash = hash_password(&account.password)?;
        Ok(account.into_user_request(account_email, password_hash))
    }

    /// Hash the password and store the account. Input validation happens before this.
    pub async fn register(&self, account: NewAccount) -> Result<User, AuthError> {
        let request = self.prepare_account(account).await?;

        let user = self.users.create(&request).await.map_err(|error| match error {
            DatabaseError::Duplicate(_) => AuthError::LoginIdTaken,
            other => AuthError::Database(other),
        })?;

        info!(user = %user.public_id, login_id = %user.login_id, role = %user.role(), "account registered");
        Ok(user)
    }

    pub async fn login(&self, login_id: &str, password: &str) -> Result<(User, AuthSession), AuthError> {
        let Some((user, stored_hash)) = self
            .users
            .find_credentials(&self.account_email(login_id))
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &stored_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let session = self.issue_session(user.id).await?;
        self.users.update_last_login(user.id).await?;

        debug!(user = %user.public_id, "session issued");
        Ok((user, session))
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let Some(stored) = self.sessions.find_by_token(token).await? else {
            return Err(AuthError::SessionNotFound);
        };

        let expires_at = DateTime::parse_from_rfc3339(&stored.expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            self.sessions.delete(token).await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let session = AuthSession {
            token: stored.token,
            user_id: stored.user_id,
            expires_at,
        };

        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await.map_err(|error| match error {
            DatabaseError::NotFound(_) => AuthError::SessionNotFound,
            other => AuthError::Database(other),
        })
    }

    /// Drop every session of a user, e.g. after deactivation.
    pub async fn revoke_sessions(&self, user_id: i64) -> Result<u64, AuthError> {
        Ok(self.sessions.delete_for_user(user_id).await?)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        Ok(self.sessions.delete_expired(&now).await?)
    }

    async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.session_ttl;

        self.sessions
            .create(
                user_id,
                &token,
                &expires_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            )
            .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let first = hash_password("s3cret!").unwrap();
        let second = hash_password("s3cret!").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &first).unwrap());
        assert!(!verify_password("wrong", &first).unwrap());
    }

    #[test]
    fn session_tokens_are_url_safe() {
        let token = generate_session_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
