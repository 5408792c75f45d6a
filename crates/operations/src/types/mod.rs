//! Shared types for cleaning operations.

pub mod errors;
pub mod events;
pub mod requests;

pub use errors::{OperationError, OperationResult};
pub use events::{DomainEvent, EventBus, EventEnvelope};
pub use requests::{
    AssignRequest, ManagerAccount, NewBuilding, NewCompany, NewConversation, NewJob, NewReview,
    NewServiceRequest, RatingSummary,
};
