//! Building entity definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub public_id: String,
    /// Public id of the owning client.
    pub owner_id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub address: String,
    pub building_type: Option<String>,
    pub floors_above: i64,
    pub floors_below: i64,
    pub parking_spaces: i64,
    /// Named zones in the order jobs walk through them.
    pub cleaning_areas: Vec<String>,
    pub special_notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Building {
    pub fn total_floors(&self) -> i64 {
        self.floors_above + self.floors_below
    }

    pub fn has_parking(&self) -> bool {
        self.parking_spaces > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBuildingRequest {
    pub owner_id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub address: String,
    pub building_type: Option<String>,
    pub floors_above: i64,
    pub floors_below: i64,
    pub parking_spaces: i64,
    pub cleaning_areas: Vec<String>,
    pub special_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBuildingRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub company_id: Option<String>,
    pub building_type: Option<String>,
    pub floors_above: Option<i64>,
    pub floors_below: Option<i64>,
    pub parking_spaces: Option<i64>,
    pub cleaning_areas: Option<Vec<String>>,
    pub special_notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildingFilter {
    pub owner_id: Option<String>,
    pub company_id: Option<String>,
    pub include_inactive: bool,
}
