//! Service request entity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Assigned,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Assigned => "assigned",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "assigned" => Ok(RequestStatus::Assigned),
            "in_progress" => Ok(RequestStatus::InProgress),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    RegularCleaning,
    SpecialCleaning,
    Complaint,
    Maintenance,
    Other,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::RegularCleaning => "regular_cleaning",
            RequestType::SpecialCleaning => "special_cleaning",
            RequestType::Complaint => "complaint",
            RequestType::Maintenance => "maintenance",
            RequestType::Other => "other",
        }
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular_cleaning" => Ok(RequestType::RegularCleaning),
            "special_cleaning" => Ok(RequestType::SpecialCleaning),
            "complaint" => Ok(RequestType::Complaint),
            "maintenance" => Ok(RequestType::Maintenance),
            "other" => Ok(RequestType::Other),
            other => Err(format!("unknown request type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl RequestPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPriority::Low => "low",
            RequestPriority::Medium => "medium",
            RequestPriority::High => "high",
            RequestPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for RequestPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RequestPriority::Low),
            "medium" => Ok(RequestPriority::Medium),
            "high" => Ok(RequestPriority::High),
            "urgent" => Ok(RequestPriority::Urgent),
            other => Err(format!("unknown request priority: {other}")),
        }
    }
}

/// Who a request was routed to when an admin approved it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub admin_id: Option<String>,
    pub worker_id: Option<String>,
    pub company_id: Option<String>,
}

/// Outcome recorded when a request is completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestResponse {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// A client-raised service ticket against a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub public_id: String,
    pub client_id: String,
    pub building_id: String,
    pub request_type: RequestType,
    pub priority: RequestPriority,
    pub title: String,
    pub description: String,
    pub photos: Vec<String>,
    pub status: RequestStatus,
    pub assigned_to: Option<Assignment>,
    pub approved_by_admin: bool,
    pub response: Option<RequestResponse>,
    pub cancel_reason: Option<String>,
    pub assigned_at: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub client_id: String,
    pub building_id: String,
    pub request_type: RequestType,
    pub priority: RequestPriority,
    pub title: String,
    pub description: String,
    pub photos: Vec<String>,
}

/// Fields written by a validated lifecycle transition. Only the fields set
/// here, the timestamp column belonging to `status`, and `updated_at` change.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStatusUpdate {
    pub status: RequestStatus,
    pub at: String,
    pub approved_by_admin: Option<bool>,
    pub assigned_to: Option<Assignment>,
    pub response: Option<RequestResponse>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub client_id: Option<String>,
    pub building_id: Option<String>,
    pub assigned_worker_id: Option<String>,
    pub assigned_company_id: Option<String>,
    /// Requests on the company's buildings or routed to the company.
    pub company_scope: Option<String>,
    pub status: Option<RequestStatus>,
}
