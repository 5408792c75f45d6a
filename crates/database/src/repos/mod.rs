//! Repository implementations for database operations

pub mod building_repository;
pub mod company_repository;
pub mod conversation_repository;
pub mod job_repository;
pub mod request_repository;
pub mod review_repository;
pub mod session_repository;
pub mod user_repository;

pub use building_repository::BuildingRepository;
pub use company_repository::CompanyRepository;
pub use conversation_repository::ConversationRepository;
pub use job_repository::JobRepository;
pub use request_repository::RequestRepository;
pub use review_repository::ReviewRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;
