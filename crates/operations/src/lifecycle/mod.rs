//! Status machines for service requests and jobs.
//!
//! Each machine validates a transition against the current status and
//! produces the status update to persist. The repository write is conditional
//! on the status the transition was validated against.

pub mod job;
pub mod request;

use thiserror::Error;

pub use job::{job_successors, plan_job_transition, validate_job_transition, JobTransition};
pub use request::{
    plan_request_transition, request_successors, validate_request_transition, RequestTransition,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move {entity} from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

impl TransitionError {
    pub(crate) fn new(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
        Self {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
