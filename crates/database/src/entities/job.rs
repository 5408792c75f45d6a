//! Job entity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Scheduled,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(JobStatus::Scheduled),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Which photo set an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    Before,
    After,
}

impl PhotoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoKind::Before => "before",
            PhotoKind::After => "after",
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            PhotoKind::Before => "before_photos",
            PhotoKind::After => "after_photos",
        }
    }
}

/// A scheduled cleaning of one building by one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub public_id: String,
    pub building_id: String,
    pub worker_id: String,
    pub company_id: Option<String>,
    pub status: JobStatus,
    pub scheduled_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub cleaning_areas: Vec<String>,
    pub before_photos: Vec<String>,
    pub after_photos: Vec<String>,
    /// Percentage of the planned areas finished, 0 to 100.
    pub completion_rate: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Job {
    pub fn photos(&self, kind: PhotoKind) -> &[String] {
        match kind {
            PhotoKind::Before => &self.before_photos,
            PhotoKind::After => &self.after_photos,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub building_id: String,
    pub worker_id: String,
    pub company_id: Option<String>,
    pub scheduled_at: String,
    pub cleaning_areas: Vec<String>,
    pub notes: Option<String>,
}

/// Fields written by a validated lifecycle transition. The repository stamps
/// the timestamp column that belongs to `status` with `at`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusUpdate {
    pub status: JobStatus,
    pub at: String,
    pub completion_rate: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub worker_id: Option<String>,
    pub building_id: Option<String>,
    pub company_id: Option<String>,
    /// Restrict to buildings owned by this client.
    pub owner_id: Option<String>,
    pub status: Option<JobStatus>,
}
