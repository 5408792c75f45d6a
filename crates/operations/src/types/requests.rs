//! Inputs accepted by the operation services.

use cleanit_database::{CreateCompanyRequest, RequestPriority, RequestType};
use serde::{Deserialize, Serialize};

/// A building registration. Clients always register for themselves, so
/// `owner_id` is only read when a manager or admin registers the building.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBuilding {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub floors_above: i64,
    #[serde(default)]
    pub floors_below: i64,
    #[serde(default)]
    pub parking_spaces: i64,
    #[serde(default)]
    pub cleaning_areas: Vec<String>,
    #[serde(default)]
    pub special_notes: Option<String>,
}

/// The manager account opened together with a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerAccount {
    pub login_id: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    pub company: CreateCompanyRequest,
    pub manager: ManagerAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub building_id: String,
    pub worker_id: String,
    /// RFC 3339 timestamp.
    pub scheduled_at: String,
    /// Defaults to the building's cleaning areas.
    #[serde(default)]
    pub cleaning_areas: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub building_id: String,
    pub request_type: RequestType,
    pub priority: RequestPriority,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Routing chosen when a pending request is assigned. At least one target is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub job_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewConversation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    /// Other participants. The creator is always added.
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Review average and completed job count for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub worker_id: String,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub completed_jobs: i64,
}
