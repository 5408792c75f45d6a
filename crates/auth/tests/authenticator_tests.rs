use chrono::{DateTime, Duration, Utc};
use cleanit_auth::{AuthError, Authenticator, NewAccount};
use cleanit_config::AuthConfig;
use cleanit_database::{
    initialize_in_memory, ClientProfile, RoleProfile, SqlitePool, UserRepository,
};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn auth_config() -> AuthConfig {
    AuthConfig {
        session_ttl_seconds: 3_600,
        account_email_domain: "cleanit.temp".to_string(),
    }
}

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    config: AuthConfig,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let pool = initialize_in_memory().await?;
        let config = auth_config();
        let authenticator = Authenticator::new(pool.clone(), &config);

        Ok(Self {
            pool,
            authenticator,
            config,
        })
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    async fn register(&self, login_id: &str, password: &str) -> TestResult<cleanit_database::User> {
        Ok(self.authenticator.register(account(login_id, password)).await?)
    }
}

fn account(login_id: &str, password: &str) -> NewAccount {
    NewAccount {
        login_id: login_id.to_string(),
        password: password.to_string(),
        name: "Alice".to_string(),
        phone: Some("010-1111-2222".to_string()),
        contact_email: Some("alice@example.com".to_string()),
        address: None,
        profile: RoleProfile::Client(ClientProfile::default()),
        is_verified: false,
    }
}

#[tokio::test]
async fn register_synthesizes_account_email_and_hashes_password() -> TestResult {
    let ctx = TestContext::new().await?;

    let user = ctx.register("alice", "s3cret!").await?;
    assert_eq!(user.account_email, "alice@cleanit.temp");
    assert_eq!(user.contact_email.as_deref(), Some("alice@example.com"));
    assert!(!user.is_verified);

    let secret: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(user.id)
        .fetch_one(ctx.pool())
        .await?;
    assert!(secret.starts_with("$argon2"), "secret must be an argon2 hash");

    Ok(())
}

#[tokio::test]
async fn register_rejects_taken_login_id() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "s3cret!").await?;

    let err = ctx
        .authenticator()
        .register(account("alice", "another1"))
        .await
        .expect_err("expected duplicate login id to fail");
    assert!(matches!(err, AuthError::LoginIdTaken));
    assert_eq!(err.to_string(), "login id is already in use");

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(user_count, 1, "no additional users should be created");

    Ok(())
}

#[tokio::test]
async fn login_returns_session_respecting_ttl() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "s3cret!").await?;

    let (user, session) = ctx.authenticator().login("alice", "s3cret!").await?;
    assert_eq!(session.user_id, user.id);

    let ttl = Duration::seconds(ctx.config.session_ttl_seconds as i64);
    let remaining = session.expires_at - Utc::now();
    assert!(
        (remaining - ttl).num_seconds().abs() <= 2,
        "session ttl should respect configuration"
    );

    let stored_expires: String = sqlx::query_scalar("SELECT expires_at FROM sessions WHERE token = ?")
        .bind(&session.token)
        .fetch_one(ctx.pool())
        .await?;
    let parsed = DateTime::parse_from_rfc3339(&stored_expires)?.with_timezone(&Utc);
    assert!((parsed - session.expires_at).num_milliseconds().abs() < 1);

    let reloaded = UserRepository::new(ctx.pool().clone())
        .find_by_id(user.id)
        .await?
        .expect("user exists");
    assert!(reloaded.last_login_at.is_some());

    Ok(())
}

#[tokio::test]
async fn login_rejects_incorrect_password() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "s3cret!").await?;

    let err = ctx
        .authenticator()
        .login("alice", "bad-secret")
        .await
        .expect_err("expected invalid password");
    assert!(matches!(err, AuthError::InvalidCredentials));

    let session_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(session_count, 0, "no sessions should be issued on failure");

    Ok(())
}

#[tokio::test]
async fn login_rejects_unknown_login_id() -> TestResult {
    let ctx = TestContext::new().await?;
    let err = ctx
        .authenticator()
        .login("nobody", "secret")
        .await
        .expect_err("expected unknown login id to fail");
    assert!(matches!(err, AuthError::InvalidCredentials));
    Ok(())
}

#[tokio::test]
async fn login_rejects_deactivated_account() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "s3cret!").await?;
    UserRepository::new(ctx.pool().clone())
        .set_active(&user.public_id, false)
        .await?;

    let err = ctx
        .authenticator()
        .login("alice", "s3cret!")
        .await
        .expect_err("expected inactive account to fail");
    assert!(matches!(err, AuthError::AccountInactive));
    Ok(())
}

#[tokio::test]
async fn authenticate_token_resolves_user() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "s3cret!").await?;
    let (_, session) = ctx.authenticator().login("alice", "s3cret!").await?;

    let (resolved, resolved_session) = ctx.authenticator().authenticate_token(&session.token).await?;
    assert_eq!(resolved.public_id, user.public_id);
    assert_eq!(resolved_session.token, session.token);

    Ok(())
}

#[tokio::test]
async fn authenticate_token_rejects_unknown_token() -> TestResult {
    let ctx = TestContext::new().await?;
    let err = ctx
        .authenticator()
        .authenticate_token("missing-token")
        .await
        .expect_err("expected missing session");
    assert!(matches!(err, AuthError::SessionNotFound));
    Ok(())
}

#[tokio::test]
async fn authenticate_token_removes_expired_session() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "s3cret!").await?;
    let (_, session) = ctx.authenticator().login("alice", "s3cret!").await?;

    sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
        .bind("2000-01-01T00:00:00.000000Z")
        .bind(&session.token)
        .execute(ctx.pool())
        .await?;

    let err = ctx
        .authenticator()
        .authenticate_token(&session.token)
        .await
        .expect_err("expected expired session");
    assert!(matches!(err, AuthError::SessionExpired));

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token = ?")
        .bind(&session.token)
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(remaining, 0, "expired session should be deleted");

    Ok(())
}

#[tokio::test]
async fn logout_invalidates_token() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "s3cret!").await?;
    let (_, session) = ctx.authenticator().login("alice", "s3cret!").await?;

    ctx.authenticator().logout(&session.token).await?;

    let err = ctx
        .authenticator()
        .authenticate_token(&session.token)
        .await
        .expect_err("expected logged out session");
    assert!(matches!(err, AuthError::SessionNotFound));

    let err = ctx
        .authenticator()
        .logout(&session.token)
        .await
        .expect_err("second logout has nothing to remove");
    assert!(matches!(err, AuthError::SessionNotFound));

    Ok(())
}

#[tokio::test]
async fn revoke_and_purge_sessions() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "s3cret!").await?;
    ctx.authenticator().login("alice", "s3cret!").await?;
    ctx.authenticator().login("alice", "s3cret!").await?;

    assert_eq!(ctx.authenticator().purge_expired_sessions().await?, 0);
    assert_eq!(ctx.authenticator().revoke_sessions(user.id).await?, 2);

    Ok(())
}
