//! Shared application state for the gateway

use cleanit_config::AppConfig;
use cleanit_database::SqlitePool;
use cleanit_operations::{
    BuildingService, CompanyService, ConversationService, EventBus, JobService, RequestService,
    ReviewService,
};
use cleanit_users::UserService;
use std::time::Duration;

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    /// Database connection pool
    pub pool: SqlitePool,
    /// Change feed fanned out to websocket subscribers
    pub events: EventBus,
    pub user_service: UserService,
    pub company_service: CompanyService,
    pub building_service: BuildingService,
    pub job_service: JobService,
    pub request_service: RequestService,
    pub review_service: ReviewService,
    pub conversation_service: ConversationService,
    /// How often live feeds re-check their session
    pub feed_session_check: Duration,
}

impl GatewayState {
    /// Create a new gateway state with all services initialized
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        let events = EventBus::new(config.events.channel_capacity);

        Self {
            user_service: UserService::new(pool.clone(), &config.auth),
            company_service: CompanyService::new(pool.clone(), &config.auth),
            building_service: BuildingService::new(pool.clone()),
            job_service: JobService::new(pool.clone(), &config.jobs, events.clone()),
            request_service: RequestService::new(pool.clone(), events.clone()),
            review_service: ReviewService::new(pool.clone(), events.clone()),
            conversation_service: ConversationService::new(pool.clone(), events.clone()),
            feed_session_check: Duration::from_secs(config.events.session_check_seconds),
            events,
            pool,
        }
    }

    pub fn user_service(&self) -> &UserService {
        &self.user_service
    }

    pub fn company_service(&self) -> &CompanyService {
        &self.company_service
    }

    pub fn building_service(&self) -> &BuildingService {
        &self.building_service
    }

    pub fn job_service(&self) -> &JobService {
        &self.job_service
    }

    pub fn request_service(&self) -> &RequestService {
        &self.request_service
    }

    pub fn review_service(&self) -> &ReviewService {
        &self.review_service
    }

    pub fn conversation_service(&self) -> &ConversationService {
        &self.conversation_service
    }
}
