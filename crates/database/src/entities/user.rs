//! User entity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Worker,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Client, Role::Worker, Role::Manager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Worker => "worker",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "worker" => Ok(Role::Worker),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub business_number: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerProfile {
    pub company_id: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Standard,
    Super,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub department: Option<String>,
}

/// Role-specific attributes. The variant is the role, so a user can never carry
/// a profile that disagrees with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Client(ClientProfile),
    Worker(WorkerProfile),
    Manager(ManagerProfile),
    Admin(AdminProfile),
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Client(_) => Role::Client,
            RoleProfile::Worker(_) => Role::Worker,
            RoleProfile::Manager(_) => Role::Manager,
            RoleProfile::Admin(_) => Role::Admin,
        }
    }

    /// Company the account works for, if any.
    pub fn company_id(&self) -> Option<&str> {
        match self {
            RoleProfile::Worker(profile) => profile.company_id.as_deref(),
            RoleProfile::Manager(profile) => Some(profile.company_id.as_str()),
            RoleProfile::Client(_) | RoleProfile::Admin(_) => None,
        }
    }

    /// An empty profile for the given role. Managers start without a company.
    pub fn empty_for(role: Role) -> Self {
        match role {
            Role::Client => RoleProfile::Client(ClientProfile::default()),
            Role::Worker => RoleProfile::Worker(WorkerProfile::default()),
            Role::Manager => RoleProfile::Manager(ManagerProfile {
                company_id: String::new(),
                department: None,
                position: None,
            }),
            Role::Admin => RoleProfile::Admin(AdminProfile::default()),
        }
    }
}

/// User entity representing an account in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub public_id: String,
    pub login_id: String,
    pub account_email: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub profile: RoleProfile,
    pub is_active: bool,
    pub is_verified: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn company_id(&self) -> Option<&str> {
        self.profile.company_id()
    }
}

/// Request for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub login_id: String,
    pub account_email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub profile: RoleProfile,
    pub is_verified: bool,
}

/// Request for updating an existing user. The profile may change its fields but
/// not its role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub profile: Option<RoleProfile>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub company_id: Option<String>,
    pub is_active: Option<bool>,
}
