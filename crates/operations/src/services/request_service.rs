//! Client service requests and their routing.

use cleanit_database::{
    timestamp_now, Assignment, Building, BuildingRepository, CompanyRepository,
    CreateServiceRequest, Page, RequestFilter, RequestRepository, RequestResponse, RequestStatus,
    Role, ServiceRequest, SqlitePool, User, UserRepository,
};
use cleanit_users::utils::validation::{validate_text, validate_url};
use cleanit_users::{has_permission, Permission};
use tracing::{info, warn};

use super::access::{manager_company, request_visible, require, require_any};
use crate::lifecycle::{plan_request_transition, RequestTransition};
use crate::types::{
    AssignRequest, DomainEvent, EventBus, NewServiceRequest, OperationError, OperationResult,
};

const MAX_PHOTOS: usize = 10;

const READ_PERMISSIONS: &[Permission] = &[
    Permission::ManageRequests,
    Permission::AssignRequests,
    Permission::ViewOwnRequests,
    Permission::ViewAssignedRequests,
];

#[derive(Clone)]
pub struct RequestService {
    requests: RequestRepository,
    buildings: BuildingRepository,
    companies: CompanyRepository,
    users: UserRepository,
    events: EventBus,
}

impl RequestService {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self {
            requests: RequestRepository::new(pool.clone()),
            buildings: BuildingRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            events,
        }
    }

    /// Raise a request against one of the client's own active buildings.
    pub async fn create(&self, actor: &User, input: NewServiceRequest) -> OperationResult<ServiceRequest> {
        require(actor, Permission::CreateRequests)?;

        let building = self.require_building(&input.building_id).await?;
        if building.owner_id != actor.public_id {
            return Err(OperationError::permission_denied("building belongs to someone else"));
        }
        if !building.is_active {
            return Err(OperationError::validation("building is inactive"));
        }

        validate_text("title", &input.title, 100)?;
        validate_text("description", &input.description, 2000)?;
        validate_photos(&input.photos, None)?;

        let request = self
            .requests
            .create(&CreateServiceRequest {
                client_id: actor.public_id.clone(),
                building_id: building.public_id.clone(),
                request_type: input.request_type,
                priority: input.priority,
                title: input.title.trim().to_string(),
                description: input.description,
                photos: input.photos,
            })
            .await?;

        info!(
            client = %actor.public_id,
            request = %request.public_id,
            building = %request.building_id,
            priority = request.priority.as_str(),
            "service request created"
        );

        self.events.publish(
            DomainEvent::RequestCreated {
                request_id: request.public_id.clone(),
                building_id: request.building_id.clone(),
            },
            vec![request.client_id.clone()],
            building.company_id.clone(),
        );

        Ok(request)
    }

    pub async fn get(&self, actor: &User, public_id: &str) -> OperationResult<ServiceRequest> {
        require_any(actor, READ_PERMISSIONS)?;

        let request = self.require_request(public_id).await?;
        let building = self.require_building(&request.building_id).await?;
        if !request_visible(actor, &request, &building) {
            return Err(OperationError::permission_denied("request belongs to someone else"));
        }

        Ok(request)
    }

    pub async fn list(
        &self,
        actor: &User,
        filter: RequestFilter,
        page: Page,
    ) -> OperationResult<Vec<ServiceRequest>> {
        require_any(actor, READ_PERMISSIONS)?;

        let mut filter = filter;
        match actor.role() {
            Role::Admin => {}
            Role::Manager => filter.company_scope = Some(manager_company(actor)?),
            Role::Worker => filter.assigned_worker_id = Some(actor.public_id.clone()),
            Role::Client => filter.client_id = Some(actor.public_id.clone()),
        }

        Ok(self.requests.list(&filter, page).await?)
    }

    /// Route a pending request to a worker and/or company. Assignment is the
    /// approval; managers route requests on their company's buildings.
    pub async fn assign(
        &self,
        actor: &User,
        public_id: &str,
        input: AssignRequest,
    ) -> OperationResult<ServiceRequest> {
        require_any(actor, &[Permission::ApproveRequests, Permission::AssignRequests])?;

        let request = self.require_request(public_id).await?;
        let building = self.require_building(&request.building_id).await?;

        let mut company_id = input.company_id;
        if actor.role() == Role::Manager {
            let own = manager_company(actor)?;
            if building.company_id.as_deref() != Some(own.as_str()) {
                return Err(OperationError::permission_denied("building is not serviced by your company"));
            }
            if company_id.as_deref().is_some_and(|id| id != own) {
                return Err(OperationError::permission_denied("cannot route to another company"));
            }
            company_id = Some(own);
        }

        if input.worker_id.is_none() && company_id.is_none() {
            return Err(OperationError::validation("assignment needs a worker or a company"));
        }

        if let Some(company_id) = company_id.as_deref() {
            match self.companies.find_by_public_id(company_id).await? {
                Some(company) if company.is_active => {}
                Some(_) => return Err(OperationError::validation("company is inactive")),
                None => return Err(OperationError::not_found("company", company_id)),
            }
        }

        if let Some(worker_id) = input.worker_id.as_deref() {
            let worker = self
                .users
                .find_by_public_id(worker_id)
                .await?
                .ok_or_else(|| OperationError::not_found("user", worker_id))?;
            if worker.role() != Role::Worker || !worker.is_active {
                return Err(OperationError::validation("requests can only be assigned to active workers"));
            }
            if let Some(company_id) = company_id.as_deref() {
                if worker.company_id() != Some(company_id) {
                    return Err(OperationError::validation("worker belongs to another company"));
                }
            }
        }

        let transition = RequestTransition::Assign {
            assignment: Assignment {
                admin_id: Some(actor.public_id.clone()),
                worker_id: input.worker_id,
                company_id,
            },
        };

        self.apply(actor, request, &building, transition).await
    }

    pub async fn start(&self, actor: &User, public_id: &str) -> OperationResult<ServiceRequest> {
        require(actor, Permission::CompleteRequests)?;

        let request = self.require_request(public_id).await?;
        let building = self.require_building(&request.building_id).await?;
        require_handler(actor, &request, &building)?;

        self.apply(actor, request, &building, RequestTransition::Start).await
    }

    /// Close a request, optionally recording what was done. Response photos
    /// must be stored under `requests/{request_id}/`.
    pub async fn complete(
        &self,
        actor: &User,
        public_id: &str,
        response: Option<RequestResponse>,
    ) -> OperationResult<ServiceRequest> {
        require(actor, Permission::CompleteRequests)?;

        let request = self.require_request(public_id).await?;
        let building = self.require_building(&request.building_id).await?;
        require_handler(actor, &request, &building)?;

        if let Some(response) = &response {
            if let Some(notes) = response.notes.as_deref() {
                validate_text("response notes", notes, 2000)?;
            }
            validate_photos(&response.photos, Some(&request.public_id))?;
        }

        self.apply(actor, request, &building, RequestTransition::Complete { response })
            .await
    }

    /// Admins cancel any request; clients only their own.
    pub async fn cancel(
        &self,
        actor: &User,
        public_id: &str,
        reason: Option<String>,
    ) -> OperationResult<ServiceRequest> {
        require_any(actor, &[Permission::ManageRequests, Permission::CancelOwnRequests])?;

        let request = self.require_request(public_id).await?;
        if !has_permission(actor.role(), Permission::ManageRequests)
            && request.client_id != actor.public_id
        {
            return Err(OperationError::permission_denied("request belongs to someone else"));
        }
        if let Some(reason) = reason.as_deref() {
            validate_text("cancel reason", reason, 500)?;
        }

        let building = self.require_building(&request.building_id).await?;
        self.apply(actor, request, &building, RequestTransition::Cancel { reason })
            .await
    }

    /// Request totals per status, for the dashboards.
    pub async fn status_counts(&self, actor: &User) -> OperationResult<Vec<(RequestStatus, i64)>> {
        require(actor, Permission::ViewReports)?;
        Ok(self.requests.count_by_status().await?)
    }

    async fn apply(
        &self,
        actor: &User,
        request: ServiceRequest,
        building: &Building,
        transition: RequestTransition,
    ) -> OperationResult<ServiceRequest> {
        let from = request.status;
        let update = plan_request_transition(from, transition, &timestamp_now())?;

        let request = self
            .requests
            .transition(&request.public_id, from, &update)
            .await
            .map_err(|error| {
                warn!(request = %request.public_id, from = %from, to = %update.status, %error, "request transition rejected");
                OperationError::from(error)
            })?;

        info!(actor = %actor.public_id, request = %request.public_id, from = %from, to = %request.status, "request status changed");

        let assignment = request.assigned_to.clone().unwrap_or_default();
        let mut recipients = vec![request.client_id.clone()];
        recipients.extend(assignment.worker_id);
        let company_id = assignment.company_id.or_else(|| building.company_id.clone());

        self.events.publish(
            DomainEvent::RequestStatusChanged {
                request_id: request.public_id.clone(),
                from,
                to: request.status,
            },
            recipients,
            company_id,
        );

        Ok(request)
    }

    async fn require_request(&self, public_id: &str) -> OperationResult<ServiceRequest> {
        self.requests
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("request", public_id))
    }

    async fn require_building(&self, public_id: &str) -> OperationResult<Building> {
        self.buildings
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("building", public_id))
    }
}

/// Workers handle requests assigned to them, managers their company's.
fn require_handler(actor: &User, request: &ServiceRequest, building: &Building) -> OperationResult<()> {
    let allowed = match actor.role() {
        Role::Admin | Role::Manager => request_visible(actor, request, building),
        Role::Worker => request
            .assigned_to
            .as_ref()
            .and_then(|assignment| assignment.worker_id.as_deref())
            == Some(actor.public_id.as_str()),
        Role::Client => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(OperationError::permission_denied("request is not assigned to you"))
    }
}

fn validate_photos(photos: &[String], request_id: Option<&str>) -> OperationResult<()> {
    if photos.len() > MAX_PHOTOS {
        return Err(OperationError::validation(format!("at most {MAX_PHOTOS} photos are allowed")));
    }

    for url in photos {
        validate_url(url)?;
        if let Some(request_id) = request_id {
            let scope = format!("requests/{request_id}/");
            if !url.contains(&scope) {
                return Err(OperationError::validation(format!("photo must be stored under {scope}")));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_photos_are_scoped_to_the_request() {
        let photos = vec!["https://cdn.cleanit.example/requests/r1/after.jpg".to_string()];
        assert!(validate_photos(&photos, Some("r1")).is_ok());
        assert!(validate_photos(&photos, Some("r2")).is_err());
        assert!(validate_photos(&photos, None).is_ok());
    }

    #[test]
    fn photo_count_is_capped() {
        let photos = vec!["https://cdn.cleanit.example/a.jpg".to_string(); MAX_PHOTOS + 1];
        assert!(validate_photos(&photos, None).is_err());
    }
}
