//! Company entity definitions

use serde::{Deserialize, Serialize};

/// A cleaning company. The worker and building counters are denormalized and
/// refreshed from the rows they count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub business_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub worker_count: i64,
    pub building_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub business_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
