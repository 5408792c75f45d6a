//! Inputs accepted by the user service.

use cleanit_database::{ClientProfile, RoleProfile};
use serde::{Deserialize, Serialize};

/// Self-service signup. Always produces an unverified client account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterClientRequest {
    pub login_id: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub profile: ClientProfile,
}

/// Account opened by an administrator for any role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub login_id: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub profile: RoleProfile,
}
