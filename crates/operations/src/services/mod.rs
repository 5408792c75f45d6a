//! Operation services. Every call takes the acting user and checks the
//! permission table and ownership before touching storage.

mod access;
pub mod building_service;
pub mod company_service;
pub mod conversation_service;
pub mod job_service;
pub mod request_service;
pub mod review_service;

pub use building_service::BuildingService;
pub use company_service::CompanyService;
pub use conversation_service::ConversationService;
pub use job_service::{photo_scope, JobService};
pub use request_service::RequestService;
pub use review_service::ReviewService;
