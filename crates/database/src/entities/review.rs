//! Review entity definitions

use serde::{Deserialize, Serialize};

/// A client's rating of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub public_id: String,
    pub job_id: String,
    pub client_id: String,
    pub worker_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub job_id: String,
    pub client_id: String,
    pub worker_id: String,
    pub rating: i64,
    pub comment: Option<String>,
}
