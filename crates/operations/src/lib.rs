//! # CleanIT Operations Crate
//!
//! Day-to-day cleaning operations on top of accounts and storage.
//!
//! - **lifecycle**: request and job status machines
//! - **services**: buildings, companies, jobs, requests, reviews and conversations
//! - **types**: inputs, errors and change events

pub mod lifecycle;
pub mod services;
pub mod types;

pub use lifecycle::{JobTransition, RequestTransition, TransitionError};
pub use services::{
    photo_scope, BuildingService, CompanyService, ConversationService, JobService,
    RequestService, ReviewService,
};
pub use types::{
    AssignRequest, DomainEvent, EventBus, EventEnvelope, ManagerAccount, NewBuilding, NewCompany,
    NewConversation, NewJob, NewReview, NewServiceRequest, OperationError, OperationResult,
    RatingSummary,
};
