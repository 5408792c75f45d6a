//! Static role/permission table.
//!
//! The table is built once on first use and never changes afterwards. Lookups
//! by role name treat unknown names as a role with no permissions.

use cleanit_database::Role;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::types::UserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOwnBuildings,
    ManageOwnBuildings,
    CreateRequests,
    ViewOwnRequests,
    CancelOwnRequests,
    ViewJobReports,
    WriteReviews,
    ViewAssignedJobs,
    UpdateJobStatus,
    UploadJobPhotos,
    ViewAssignedRequests,
    CompleteRequests,
    ManageWorkers,
    ManageBuildings,
    ManageJobs,
    ViewCompany,
    ViewReports,
    AssignRequests,
    ManageUsers,
    ManageCompanies,
    ApproveRequests,
    ManageRequests,
    SystemSettings,
    UseChat,
}

impl Permission {
    pub const ALL: [Permission; 24] = [
        Permission::ViewOwnBuildings,
        Permission::ManageOwnBuildings,
        Permission::CreateRequests,
        Permission::ViewOwnRequests,
        Permission::CancelOwnRequests,
        Permission::ViewJobReports,
        Permission::WriteReviews,
        Permission::ViewAssignedJobs,
        Permission::UpdateJobStatus,
        Permission::UploadJobPhotos,
        Permission::ViewAssignedRequests,
        Permission::CompleteRequests,
        Permission::ManageWorkers,
        Permission::ManageBuildings,
        Permission::ManageJobs,
        Permission::ViewCompany,
        Permission::ViewReports,
        Permission::AssignRequests,
        Permission::ManageUsers,
        Permission::ManageCompanies,
        Permission::ApproveRequests,
        Permission::ManageRequests,
        Permission::SystemSettings,
        Permission::UseChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewOwnBuildings => "view_own_buildings",
            Permission::ManageOwnBuildings => "manage_own_buildings",
            Permission::CreateRequests => "create_requests",
            Permission::ViewOwnRequests => "view_own_requests",
            Permission::CancelOwnRequests => "cancel_own_requests",
            Permission::ViewJobReports => "view_job_reports",
            Permission::WriteReviews => "write_reviews",
            Permission::ViewAssignedJobs => "view_assigned_jobs",
            Permission::UpdateJobStatus => "update_job_status",
            Permission::UploadJobPhotos => "upload_job_photos",
            Permission::ViewAssignedRequests => "view_assigned_requests",
            Permission::CompleteRequests => "complete_requests",
            Permission::ManageWorkers => "manage_workers",
            Permission::ManageBuildings => "manage_buildings",
            Permission::ManageJobs => "manage_jobs",
            Permission::ViewCompany => "view_company",
            Permission::ViewReports => "view_reports",
            Permission::AssignRequests => "assign_requests",
            Permission::ManageUsers => "manage_users",
            Permission::ManageCompanies => "manage_companies",
            Permission::ApproveRequests => "approve_requests",
            Permission::ManageRequests => "manage_requests",
            Permission::SystemSettings => "system_settings",
            Permission::UseChat => "use_chat",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| format!("unknown permission: {s}"))
    }
}

/// Landing view for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainScreen {
    ClientHome,
    WorkerHome,
    ManagerDashboard,
    AdminDashboard,
    Login,
}

impl MainScreen {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainScreen::ClientHome => "client_home",
            MainScreen::WorkerHome => "worker_home",
            MainScreen::ManagerDashboard => "manager_dashboard",
            MainScreen::AdminDashboard => "admin_dashboard",
            MainScreen::Login => "login",
        }
    }
}

static ROLE_PERMISSIONS: Lazy<HashMap<Role, BTreeSet<Permission>>> = Lazy::new(|| {
    use Permission::*;

    let client = [
        ViewOwnBuildings,
        ManageOwnBuildings,
        CreateRequests,
        ViewOwnRequests,
        CancelOwnRequests,
        ViewJobReports,
        WriteReviews,
        UseChat,
    ];
    let worker = [
        ViewAssignedJobs,
        UpdateJobStatus,
        UploadJobPhotos,
        ViewAssignedRequests,
        CompleteRequests,
        UseChat,
    ];
    let manager = [
        ManageWorkers,
        ManageBuildings,
        ManageJobs,
        ViewCompany,
        ViewReports,
        ViewJobReports,
        UpdateJobStatus,
        AssignRequests,
        CompleteRequests,
        UseChat,
    ];
    let admin = [
        ManageUsers,
        ManageCompanies,
        ManageWorkers,
        ManageBuildings,
        ManageJobs,
        ViewCompany,
        ViewReports,
        ViewJobReports,
        UpdateJobStatus,
        ApproveRequests,
        AssignRequests,
        ManageRequests,
        CompleteRequests,
        SystemSettings,
        UseChat,
    ];

    HashMap::from([
        (Role::Client, client.into_iter().collect()),
        (Role::Worker, worker.into_iter().collect()),
        (Role::Manager, manager.into_iter().collect()),
        (Role::Admin, admin.into_iter().collect()),
    ])
});

static NO_PERMISSIONS: BTreeSet<Permission> = BTreeSet::new();

pub fn permissions_for(role: Role) -> &'static BTreeSet<Permission> {
    ROLE_PERMISSIONS.get(&role).unwrap_or(&NO_PERMISSIONS)
}

/// Permissions of a role given by name. Unknown names have none.
pub fn permissions_for_name(role: &str) -> &'static BTreeSet<Permission> {
    role.parse::<Role>()
        .map(permissions_for)
        .unwrap_or(&NO_PERMISSIONS)
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

pub fn has_any_permission(role: Role, permissions: &[Permission]) -> bool {
    let granted = permissions_for(role);
    permissions.iter().any(|permission| granted.contains(permission))
}

/// True for an empty list.
pub fn has_all_permissions(role: Role, permissions: &[Permission]) -> bool {
    let granted = permissions_for(role);
    permissions.iter().all(|permission| granted.contains(permission))
}

pub fn can_access_admin_ui(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Manager)
}

pub fn main_screen(role: Role) -> MainScreen {
    match role {
        Role::Client => MainScreen::ClientHome,
        Role::Worker => MainScreen::WorkerHome,
        Role::Manager => MainScreen::ManagerDashboard,
        Role::Admin => MainScreen::AdminDashboard,
    }
}

/// Landing view for a role given by name, `Login` for anything unrecognised.
pub fn main_screen_for_name(role: &str) -> MainScreen {
    role.parse::<Role>()
        .map(main_screen)
        .unwrap_or(MainScreen::Login)
}

/// Permission checks that fail with a `UserError`.
pub struct PermissionChecker;

impl PermissionChecker {
    pub fn require(role: Role, permission: Permission) -> Result<(), UserError> {
        if !has_permission(role, permission) {
            return Err(UserError::permission_denied(format!(
                "role {role} lacks {permission}"
            )));
        }
        Ok(())
    }

    pub fn require_any(role: Role, permissions: &[Permission]) -> Result<(), UserError> {
        if !has_any_permission(role, permissions) {
            let names: Vec<_> = permissions.iter().map(Permission::as_str).collect();
            return Err(UserError::permission_denied(format!(
                "role {role} lacks all of {}",
                names.join(", ")
            )));
        }
        Ok(())
    }
}
