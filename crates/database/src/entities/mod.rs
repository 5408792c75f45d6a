//! Domain entities for the database layer

pub mod building;
pub mod company;
pub mod conversation;
pub mod job;
pub mod request;
pub mod review;
pub mod session;
pub mod user;

pub use building::{Building, BuildingFilter, CreateBuildingRequest, UpdateBuildingRequest};
pub use company::{Company, CreateCompanyRequest};
pub use conversation::{Conversation, CreateConversationRequest, CreateMessageRequest, Message};
pub use job::{CreateJobRequest, Job, JobFilter, JobStatus, JobStatusUpdate, PhotoKind};
pub use request::{
    Assignment, CreateServiceRequest, RequestFilter, RequestPriority, RequestResponse,
    RequestStatus, RequestStatusUpdate, RequestType, ServiceRequest,
};
pub use review::{CreateReviewRequest, Review};
pub use session::AuthSession;
pub use user::{
    AccessLevel, AdminProfile, ClientProfile, CreateUserRequest, ManagerProfile, Role, RoleProfile,
    UnknownRole, UpdateUserRequest, User, UserFilter, WorkerProfile,
};
