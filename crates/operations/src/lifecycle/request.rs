//! Service request lifecycle.
//!
//! ```text
//! pending -> assigned -> in_progress -> completed
//!    \          \             \
//!     +----------+-------------+--> cancelled
//! ```

use cleanit_database::{Assignment, RequestResponse, RequestStatus, RequestStatusUpdate};

use super::TransitionError;

/// A requested change of status with the data that travels with it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestTransition {
    /// Approval and routing to a worker and/or company. Always marks the
    /// request as approved.
    Assign { assignment: Assignment },
    Start,
    Complete { response: Option<RequestResponse> },
    Cancel { reason: Option<String> },
}

impl RequestTransition {
    pub fn target(&self) -> RequestStatus {
        match self {
            RequestTransition::Assign { .. } => RequestStatus::Assigned,
            RequestTransition::Start => RequestStatus::InProgress,
            RequestTransition::Complete { .. } => RequestStatus::Completed,
            RequestTransition::Cancel { .. } => RequestStatus::Cancelled,
        }
    }
}

/// Statuses reachable in one step from `from`.
pub fn request_successors(from: RequestStatus) -> &'static [RequestStatus] {
    match from {
        RequestStatus::Pending => &[RequestStatus::Assigned, RequestStatus::Cancelled],
        RequestStatus::Assigned => &[RequestStatus::InProgress, RequestStatus::Cancelled],
        RequestStatus::InProgress => &[RequestStatus::Completed, RequestStatus::Cancelled],
        RequestStatus::Completed | RequestStatus::Cancelled => &[],
    }
}

pub fn validate_request_transition(
    from: RequestStatus,
    to: RequestStatus,
) -> Result<(), TransitionError> {
    if request_successors(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::new("request", from, to))
    }
}

/// Validate `transition` from `from` and build the update to persist at `at`.
pub fn plan_request_transition(
    from: RequestStatus,
    transition: RequestTransition,
    at: &str,
) -> Result<RequestStatusUpdate, TransitionError> {
    let status = transition.target();
    validate_request_transition(from, status)?;

    let mut update = RequestStatusUpdate {
        status,
        at: at.to_string(),
        approved_by_admin: None,
        assigned_to: None,
        response: None,
        cancel_reason: None,
    };

    match transition {
        RequestTransition::Assign { assignment } => {
            update.approved_by_admin = Some(true);
            update.assigned_to = Some(assignment);
        }
        RequestTransition::Start => {}
        RequestTransition::Complete { response } => {
            update.response = response.map(|mut response| {
                response.completed_at.get_or_insert_with(|| at.to_string());
                response
            });
        }
        RequestTransition::Cancel { reason } => {
            update.cancel_reason = reason;
        }
    }

    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: &str = "2030-01-01T00:00:00.000000Z";

    #[test]
    fn forward_path_is_legal() {
        assert!(validate_request_transition(RequestStatus::Pending, RequestStatus::Assigned).is_ok());
        assert!(validate_request_transition(RequestStatus::Assigned, RequestStatus::InProgress).is_ok());
        assert!(validate_request_transition(RequestStatus::InProgress, RequestStatus::Completed).is_ok());
    }

    #[test]
    fn cancel_is_legal_from_every_open_status() {
        for status in RequestStatus::ALL {
            let result = validate_request_transition(status, RequestStatus::Cancelled);
            assert_eq!(result.is_ok(), !status.is_terminal(), "{status}");
        }
    }

    #[test]
    fn skipping_and_reversing_are_rejected() {
        let illegal = [
            (RequestStatus::Pending, RequestStatus::InProgress),
            (RequestStatus::Pending, RequestStatus::Completed),
            (RequestStatus::Assigned, RequestStatus::Pending),
            (RequestStatus::InProgress, RequestStatus::Assigned),
            (RequestStatus::Cancelled, RequestStatus::Completed),
            (RequestStatus::Completed, RequestStatus::Cancelled),
            (RequestStatus::Pending, RequestStatus::Pending),
        ];

        for (from, to) in illegal {
            let error = validate_request_transition(from, to).unwrap_err();
            assert_eq!(error.to_string(), format!("cannot move request from {from} to {to}"));
        }
    }

    #[test]
    fn terminal_statuses_have_no_successors() {
        for status in RequestStatus::ALL {
            assert_eq!(request_successors(status).is_empty(), status.is_terminal());
        }
    }

    #[test]
    fn assignment_sets_approval_and_routing_only() {
        let assignment = Assignment {
            admin_id: Some("admin".to_string()),
            worker_id: Some("worker".to_string()),
            company_id: None,
        };
        let update = plan_request_transition(
            RequestStatus::Pending,
            RequestTransition::Assign {
                assignment: assignment.clone(),
            },
            AT,
        )
        .unwrap();

        assert_eq!(update.status, RequestStatus::Assigned);
        assert_eq!(update.approved_by_admin, Some(true));
        assert_eq!(update.assigned_to, Some(assignment));
        assert!(update.response.is_none());
        assert!(update.cancel_reason.is_none());
    }

    #[test]
    fn completion_response_gets_a_timestamp() {
        let update = plan_request_transition(
            RequestStatus::InProgress,
            RequestTransition::Complete {
                response: Some(RequestResponse {
                    notes: Some("fixed".to_string()),
                    ..Default::default()
                }),
            },
            AT,
        )
        .unwrap();

        let response = update.response.unwrap();
        assert_eq!(response.completed_at.as_deref(), Some(AT));
    }

    #[test]
    fn cancelled_request_cannot_complete() {
        let error = plan_request_transition(
            RequestStatus::Cancelled,
            RequestTransition::Complete { response: None },
            AT,
        )
        .unwrap_err();
        assert_eq!(error.entity, "request");
        assert_eq!(error.from, "cancelled");
        assert_eq!(error.to, "completed");
    }
}
