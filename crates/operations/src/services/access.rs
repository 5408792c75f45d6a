//! Ownership scoping applied on top of the permission table.

use cleanit_database::{Building, Job, Role, ServiceRequest, User};
use cleanit_users::{Permission, PermissionChecker};

use crate::types::{OperationError, OperationResult};

pub(crate) fn require(actor: &User, permission: Permission) -> OperationResult<()> {
    Ok(PermissionChecker::require(actor.role(), permission)?)
}

pub(crate) fn require_any(actor: &User, permissions: &[Permission]) -> OperationResult<()> {
    Ok(PermissionChecker::require_any(actor.role(), permissions)?)
}

fn same_company(left: Option<&str>, right: Option<&str>) -> bool {
    matches!((left, right), (Some(a), Some(b)) if !a.is_empty() && a == b)
}

/// The company a manager acts for.
pub(crate) fn manager_company(actor: &User) -> OperationResult<String> {
    actor
        .company_id()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| OperationError::permission_denied("account is not attached to a company"))
}

pub(crate) fn building_visible(actor: &User, building: &Building) -> bool {
    match actor.role() {
        Role::Admin => true,
        Role::Manager => same_company(building.company_id.as_deref(), actor.company_id()),
        Role::Client => building.owner_id == actor.public_id,
        Role::Worker => false,
    }
}

/// `owner_id` is the owner of the job's building.
pub(crate) fn job_visible(actor: &User, job: &Job, owner_id: &str) -> bool {
    match actor.role() {
        Role::Admin => true,
        Role::Manager => same_company(job.company_id.as_deref(), actor.company_id()),
        Role::Worker => job.worker_id == actor.public_id,
        Role::Client => owner_id == actor.public_id,
    }
}

pub(crate) fn request_visible(actor: &User, request: &ServiceRequest, building: &Building) -> bool {
    let assignment = request.assigned_to.as_ref();
    match actor.role() {
        Role::Admin => true,
        Role::Manager => {
            same_company(building.company_id.as_deref(), actor.company_id())
                || same_company(
                    assignment.and_then(|a| a.company_id.as_deref()),
                    actor.company_id(),
                )
        }
        Role::Worker => assignment.and_then(|a| a.worker_id.as_deref()) == Some(actor.public_id.as_str()),
        Role::Client => request.client_id == actor.public_id,
    }
}
