//! CleanIT Database Crate
//!
//! Connection management, migrations, entity definitions and repository
//! implementations for the CleanIT backend. Entities are addressed by a
//! generated public id; integer row ids stay internal to the backend.

use chrono::{SecondsFormat, Utc};
use cleanit_config::DatabaseConfig;
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::run_migrations;

pub use repos::{
    BuildingRepository, CompanyRepository, ConversationRepository, JobRepository,
    RequestRepository, ReviewRepository, SessionRepository, UserRepository,
};

pub use entities::{
    building::{Building, BuildingFilter, CreateBuildingRequest, UpdateBuildingRequest},
    company::{Company, CreateCompanyRequest},
    conversation::{Conversation, CreateConversationRequest, CreateMessageRequest, Message},
    job::{CreateJobRequest, Job, JobFilter, JobStatus, JobStatusUpdate, PhotoKind},
    request::{
        Assignment, CreateServiceRequest, RequestFilter, RequestPriority, RequestResponse,
        RequestStatus, RequestStatusUpdate, RequestType, ServiceRequest,
    },
    review::{CreateReviewRequest, Review},
    session::AuthSession,
    user::{
        AccessLevel, AdminProfile, ClientProfile, CreateUserRequest, ManagerProfile, Role,
        RoleProfile, UnknownRole, UpdateUserRequest, User, UserFilter, WorkerProfile,
    },
};

pub use types::{DatabaseError, DatabaseResult, Page};

pub use sqlx::SqlitePool;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Generate a public identifier for a new row.
pub fn new_public_id() -> String {
    CUID.create_id()
}

/// Current UTC time in the fixed-width RFC 3339 form stored in every timestamp column.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}

/// Open a migrated private in-memory database.
pub async fn initialize_in_memory() -> DatabaseResult<SqlitePool> {
    initialize_database(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
}
