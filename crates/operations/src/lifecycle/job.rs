//! Job lifecycle.
//!
//! ```text
//! scheduled -> in_progress -> completed
//!     \             \
//!      +-------------+--> cancelled
//! ```

use cleanit_database::{JobStatus, JobStatusUpdate};

use super::TransitionError;

#[derive(Debug, Clone, PartialEq)]
pub enum JobTransition {
    Start,
    /// `completion_rate` defaults to 100 when omitted.
    Complete {
        completion_rate: Option<f64>,
        notes: Option<String>,
    },
    /// The reason, if given, replaces the job notes.
    Cancel { reason: Option<String> },
}

impl JobTransition {
    pub fn target(&self) -> JobStatus {
        match self {
            JobTransition::Start => JobStatus::InProgress,
            JobTransition::Complete { .. } => JobStatus::Completed,
            JobTransition::Cancel { .. } => JobStatus::Cancelled,
        }
    }
}

pub fn job_successors(from: JobStatus) -> &'static [JobStatus] {
    match from {
        JobStatus::Scheduled => &[JobStatus::InProgress, JobStatus::Cancelled],
        JobStatus::InProgress => &[JobStatus::Completed, JobStatus::Cancelled],
        JobStatus::Completed | JobStatus::Cancelled => &[],
    }
}

pub fn validate_job_transition(from: JobStatus, to: JobStatus) -> Result<(), TransitionError> {
    if job_successors(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::new("job", from, to))
    }
}

pub fn plan_job_transition(
    from: JobStatus,
    transition: JobTransition,
    at: &str,
) -> Result<JobStatusUpdate, TransitionError> {
    let status = transition.target();
    validate_job_transition(from, status)?;

    let (completion_rate, notes) = match transition {
        JobTransition::Start => (None, None),
        JobTransition::Complete {
            completion_rate,
            notes,
        } => (Some(completion_rate.unwrap_or(100.0)), notes),
        JobTransition::Cancel { reason } => (None, reason),
    };

    Ok(JobStatusUpdate {
        status,
        at: at.to_string(),
        completion_rate,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: &str = "2030-01-01T00:00:00.000000Z";

    #[test]
    fn forward_path_is_legal() {
        assert!(validate_job_transition(JobStatus::Scheduled, JobStatus::InProgress).is_ok());
        assert!(validate_job_transition(JobStatus::InProgress, JobStatus::Completed).is_ok());
    }

    #[test]
    fn cancel_only_from_open_statuses() {
        assert!(validate_job_transition(JobStatus::Scheduled, JobStatus::Cancelled).is_ok());
        assert!(validate_job_transition(JobStatus::InProgress, JobStatus::Cancelled).is_ok());
        assert!(validate_job_transition(JobStatus::Completed, JobStatus::Cancelled).is_err());
        assert!(validate_job_transition(JobStatus::Cancelled, JobStatus::Cancelled).is_err());
    }

    #[test]
    fn cannot_skip_or_revive() {
        assert!(validate_job_transition(JobStatus::Scheduled, JobStatus::Completed).is_err());
        assert!(validate_job_transition(JobStatus::InProgress, JobStatus::Scheduled).is_err());
        assert!(validate_job_transition(JobStatus::Cancelled, JobStatus::Completed).is_err());
        assert!(validate_job_transition(JobStatus::Completed, JobStatus::InProgress).is_err());
    }

    #[test]
    fn every_pair_agrees_with_successors() {
        for from in JobStatus::ALL {
            for to in JobStatus::ALL {
                assert_eq!(
                    validate_job_transition(from, to).is_ok(),
                    job_successors(from).contains(&to)
                );
            }
        }
    }

    #[test]
    fn completion_defaults_to_full_rate() {
        let update = plan_job_transition(
            JobStatus::InProgress,
            JobTransition::Complete {
                completion_rate: None,
                notes: None,
            },
            AT,
        )
        .unwrap();
        assert_eq!(update.status, JobStatus::Completed);
        assert_eq!(update.completion_rate, Some(100.0));
        assert_eq!(update.at, AT);
    }

    #[test]
    fn start_touches_nothing_else() {
        let update = plan_job_transition(JobStatus::Scheduled, JobTransition::Start, AT).unwrap();
        assert_eq!(update.completion_rate, None);
        assert_eq!(update.notes, None);
    }
}
