use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION,
            CONTENT_TYPE, ORIGIN,
        },
        Method, Request, StatusCode,
    },
    Router,
};
use cleanit_auth::{Authenticator, NewAccount};
use cleanit_config::AppConfig;
use cleanit_database::{initialize_in_memory, AdminProfile, RoleProfile};
use cleanit_gateway::{create_router, GatewayState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

struct TestContext {
    router: Router,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let mut config = AppConfig::default();
        config.jobs.require_photos_for_completion = false;
        Self::with_config(config).await
    }

    async fn with_config(config: AppConfig) -> TestResult<Self> {
        let pool = initialize_in_memory().await?;

        Authenticator::new(pool.clone(), &config.auth)
            .register(NewAccount {
                login_id: "root_admin".to_string(),
                password: "admin123".to_string(),
                name: "Admin".to_string(),
                phone: None,
                contact_email: None,
                address: None,
                profile: RoleProfile::Admin(AdminProfile::default()),
                is_verified: true,
            })
            .await?;

        let state = GatewayState::new(pool, &config);
        Ok(Self {
            router: create_router(state, &config.http.cors_origins),
        })
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    async fn login(&self, login_id: &str, password: &str) -> TestResult<String> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "login_id": login_id, "password": password })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    /// Admin, a company with its manager, a worker in it and a registered client.
    async fn seed(&self) -> TestResult<Seed> {
        let admin = self.login("root_admin", "admin123").await?;

        let (status, company) = self
            .send(
                Method::POST,
                "/api/companies",
                Some(&admin),
                Some(json!({
                    "name": "Sparkle Cleaning",
                    "manager": { "login_id": "sparkle_mgr", "password": "manager123", "name": "Lee Manager" }
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{company}");
        let company_id = company["company"]["id"].as_str().unwrap_or_default().to_string();

        let (status, worker) = self
            .send(
                Method::POST,
                "/api/users",
                Some(&admin),
                Some(json!({
                    "login_id": "worker01",
                    "password": "worker123",
                    "name": "Park Worker",
                    "profile": { "role": "worker", "company_id": company_id }
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{worker}");

        let (status, client) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "login_id": "kimclient", "password": "client123", "name": "Kim Client" })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{client}");

        Ok(Seed {
            manager: self.login("sparkle_mgr", "manager123").await?,
            worker: self.login("worker01", "worker123").await?,
            client: self.login("kimclient", "client123").await?,
            worker_id: worker["id"].as_str().unwrap_or_default().to_string(),
            company_id,
            admin,
        })
    }
}

struct Seed {
    admin: String,
    manager: String,
    worker: String,
    client: String,
    worker_id: String,
    company_id: String,
}

#[tokio::test]
async fn health_is_public() -> TestResult {
    let ctx = TestContext::new().await?;
    let (status, body) = ctx.send(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_session() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx.send(Method::GET, "/api/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "401");

    let (status, _) = ctx
        .send(Method::GET, "/api/buildings", Some("not-a-token"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn me_reports_screen_and_permissions() -> TestResult {
    let ctx = TestContext::new().await?;
    let seed = ctx.seed().await?;

    let (status, me) = ctx.send(Method::GET, "/api/auth/me", Some(&seed.admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["role"], "admin");
    assert_eq!(me["can_access_admin_ui"], true);
    assert!(me["permissions"]
        .as_array()
        .is_some_and(|permissions| permissions.iter().any(|p| p == "manage_users")));

    let (_, me) = ctx.send(Method::GET, "/api/auth/me", Some(&seed.client), None).await?;
    assert_eq!(me["user"]["role"], "client");
    assert_eq!(me["can_access_admin_ui"], false);
    assert_eq!(me["user"]["is_verified"], false);
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_token() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.login("root_admin", "admin123").await?;

    let (status, _) = ctx.send(Method::POST, "/api/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_and_duplicate_logins() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "login_id": "root_admin", "password": "wrong123" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "login_id": "root_admin", "password": "client123", "name": "Copycat" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"], "409");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "login_id": "ab", "password": "client123", "name": "Too Short" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn permission_table_gates_routes() -> TestResult {
    let ctx = TestContext::new().await?;
    let seed = ctx.seed().await?;

    let (status, _) = ctx.send(Method::GET, "/api/users", Some(&seed.client), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(Method::GET, "/api/buildings", Some(&seed.worker), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(Method::GET, "/api/reports/summary", Some(&seed.client), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, summary) = ctx
        .send(Method::GET, "/api/reports/summary", Some(&seed.admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["users"]["worker"], 1);

    let (status, companies) = ctx
        .send(Method::GET, "/api/companies", Some(&seed.manager), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(companies.as_array().map(Vec::len), Some(1));
    assert_eq!(companies[0]["id"], seed.company_id.as_str());
    Ok(())
}

#[tokio::test]
async fn request_flows_from_pending_to_completed() -> TestResult {
    let ctx = TestContext::new().await?;
    let seed = ctx.seed().await?;

    let (status, building) = ctx
        .send(
            Method::POST,
            "/api/buildings",
            Some(&seed.client),
            Some(json!({ "name": "Main Tower", "address": "1 Main St", "floors_above": 10, "cleaning_areas": ["lobby", "stairs"] })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{building}");
    let building_id = building["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(building["total_floors"], 10);

    let (status, request) = ctx
        .send(
            Method::POST,
            "/api/requests",
            Some(&seed.client),
            Some(json!({
                "building_id": building_id,
                "request_type": "complaint",
                "priority": "high",
                "title": "Lobby floor sticky",
                "description": "The lobby floor was left sticky after the last visit."
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{request}");
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap_or_default().to_string();

    let (status, assigned) = ctx
        .send(
            Method::POST,
            &format!("/api/requests/{request_id}/assign"),
            Some(&seed.admin),
            Some(json!({ "worker_id": seed.worker_id, "company_id": seed.company_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{assigned}");
    assert_eq!(assigned["status"], "assigned");
    assert_eq!(assigned["approved_by_admin"], true);

    let (status, _) = ctx
        .send(Method::POST, &format!("/api/requests/{request_id}/start"), Some(&seed.worker), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, completed) = ctx
        .send(
            Method::POST,
            &format!("/api/requests/{request_id}/complete"),
            Some(&seed.worker),
            Some(json!({ "notes": "Mopped twice" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{completed}");
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["response"]["notes"], "Mopped twice");

    let (status, body) = ctx
        .send(Method::POST, &format!("/api/requests/{request_id}/cancel"), Some(&seed.client), None)
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    Ok(())
}

#[tokio::test]
async fn unknown_enum_values_are_rejected() -> TestResult {
    let ctx = TestContext::new().await?;
    let seed = ctx.seed().await?;

    let (status, body) = ctx
        .send(Method::GET, "/api/jobs?status=done", Some(&seed.admin), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request: unknown job status: done");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/requests",
            Some(&seed.client),
            Some(json!({ "building_id": "x", "request_type": "party", "title": "t", "description": "d" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn job_runs_and_gets_reviewed() -> TestResult {
    let ctx = TestContext::new().await?;
    let seed = ctx.seed().await?;

    let (_, building) = ctx
        .send(
            Method::POST,
            "/api/buildings",
            Some(&seed.admin),
            Some(json!({
                "name": "Harbor Office",
                "address": "9 Pier Rd",
                "company_id": seed.company_id,
                "owner_id": client_id(&ctx, &seed.client).await?,
                "cleaning_areas": ["lobby"]
            })),
        )
        .await?;
    let building_id = building["id"].as_str().unwrap_or_default().to_string();

    let (status, job) = ctx
        .send(
            Method::POST,
            "/api/jobs",
            Some(&seed.manager),
            Some(json!({ "building_id": building_id, "worker_id": seed.worker_id, "scheduled_at": "2026-03-01T09:00:00Z" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{job}");
    assert_eq!(job["cleaning_areas"], json!(["lobby"]));
    let job_id = job["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/jobs/{job_id}/photos"),
            Some(&seed.worker),
            Some(json!({ "kind": "during", "url": "https://cdn.example.com/x.jpg" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, started) = ctx
        .send(Method::POST, &format!("/api/jobs/{job_id}/start"), Some(&seed.worker), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");

    let (status, early) = ctx
        .send(
            Method::POST,
            "/api/reviews",
            Some(&seed.client),
            Some(json!({ "job_id": job_id, "rating": 5 })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{early}");

    let (status, completed) = ctx
        .send(
            Method::POST,
            &format!("/api/jobs/{job_id}/complete"),
            Some(&seed.worker),
            Some(json!({ "completion_rate": 100.0 })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{completed}");
    assert!(completed["completed_at"].is_string());

    let (status, review) = ctx
        .send(
            Method::POST,
            "/api/reviews",
            Some(&seed.client),
            Some(json!({ "job_id": job_id, "rating": 4, "comment": "Good work" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{review}");

    let (status, reviews) = ctx
        .send(Method::GET, &format!("/api/reviews?job_id={job_id}"), Some(&seed.admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews[0]["rating"], 4);

    let (status, rating) = ctx
        .send(
            Method::GET,
            &format!("/api/workers/{}/rating", seed.worker_id),
            Some(&seed.admin),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["completed_jobs"], 1);
    assert_eq!(rating["review_count"], 1);

    let (status, _) = ctx
        .send(Method::POST, &format!("/api/jobs/{job_id}/cancel"), Some(&seed.admin), None)
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn conversations_carry_messages() -> TestResult {
    let ctx = TestContext::new().await?;
    let seed = ctx.seed().await?;

    let (status, conversation) = ctx
        .send(
            Method::POST,
            "/api/conversations",
            Some(&seed.manager),
            Some(json!({ "title": "Shift handover", "participants": [seed.worker_id] })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{conversation}");
    let conversation_id = conversation["id"].as_str().unwrap_or_default().to_string();
    let messages_uri = format!("/api/conversations/{conversation_id}/messages");

    let (status, _) = ctx
        .send(Method::POST, &messages_uri, Some(&seed.worker), Some(json!({ "content": "On my way" })))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, messages) = ctx.send(Method::GET, &messages_uri, Some(&seed.manager), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["content"], "On my way");

    let (status, _) = ctx.send(Method::GET, &messages_uri, Some(&seed.client), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> TestResult {
    let ctx = TestContext::new().await?;
    let (status, doc) = ctx.send(Method::GET, "/api-docs/openapi.json", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/requests/{request_id}/assign"].is_object());
    Ok(())
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() -> TestResult {
    let mut config = AppConfig::default();
    config.http.cors_origins = vec!["https://app.cleanit.example".to_string()];
    let ctx = TestContext::with_config(config).await?;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/buildings")
        .header(ORIGIN, "https://app.cleanit.example")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())?;
    let response = ctx.router.clone().oneshot(request).await?;

    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("https://app.cleanit.example")
    );
    Ok(())
}

async fn client_id(ctx: &TestContext, token: &str) -> TestResult<String> {
    let (_, me) = ctx.send(Method::GET, "/api/auth/me", Some(token), None).await?;
    Ok(me["user"]["id"].as_str().unwrap_or_default().to_string())
}
