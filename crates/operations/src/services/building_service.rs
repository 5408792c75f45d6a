//! Building registration and lookup.

use cleanit_database::{
    Building, BuildingFilter, BuildingRepository, CompanyRepository, CreateBuildingRequest,
    JobFilter, JobRepository, Page, Role, SqlitePool, UpdateBuildingRequest, User,
    UserRepository,
};
use cleanit_users::utils::validation::validate_text;
use cleanit_users::{has_permission, Permission};
use tracing::info;

use super::access::{building_visible, manager_company, require_any};
use crate::types::{NewBuilding, OperationError, OperationResult};

#[derive(Clone)]
pub struct BuildingService {
    buildings: BuildingRepository,
    companies: CompanyRepository,
    users: UserRepository,
    jobs: JobRepository,
}

impl BuildingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            buildings: BuildingRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            jobs: JobRepository::new(pool),
        }
    }

    /// Clients register buildings for themselves. Managers and admins register
    /// on behalf of a client; a manager's buildings always belong to their company.
    pub async fn create(&self, actor: &User, input: NewBuilding) -> OperationResult<Building> {
        require_any(actor, &[Permission::ManageBuildings, Permission::ManageOwnBuildings])?;

        let (owner_id, company_id) = if has_permission(actor.role(), Permission::ManageBuildings) {
            let owner_id = input
                .owner_id
                .clone()
                .ok_or_else(|| OperationError::validation("owner_id is required"))?;
            self.require_client(&owner_id).await?;

            let company_id = match actor.role() {
                Role::Manager => Some(manager_company(actor)?),
                _ => input.company_id.clone(),
            };
            (owner_id, company_id)
        } else {
            (actor.public_id.clone(), None)
        };

        if let Some(company_id) = company_id.as_deref() {
            self.require_company(company_id).await?;
        }

        validate_building_fields(
            Some(&input.name),
            Some(&input.address),
            Some(input.floors_above),
            Some(input.floors_below),
            Some(input.parking_spaces),
            Some(&input.cleaning_areas),
        )?;

        let building = self
            .buildings
            .create(&CreateBuildingRequest {
                owner_id,
                company_id,
                name: input.name.trim().to_string(),
                address: input.address.trim().to_string(),
                building_type: input.building_type,
                floors_above: input.floors_above,
                floors_below: input.floors_below,
                parking_spaces: input.parking_spaces,
                cleaning_areas: input.cleaning_areas,
                special_notes: input.special_notes,
            })
            .await?;

        if let Some(company_id) = building.company_id.as_deref() {
            self.companies.refresh_counters(company_id).await?;
        }

        info!(actor = %actor.public_id, building = %building.public_id, owner = %building.owner_id, "building registered");
        Ok(building)
    }

    /// Workers may read a building they have a job at.
    pub async fn get(&self, actor: &User, public_id: &str) -> OperationResult<Building> {
        require_any(
            actor,
            &[
                Permission::ManageBuildings,
                Permission::ViewOwnBuildings,
                Permission::ViewAssignedJobs,
            ],
        )?;

        let building = self.require_building(public_id).await?;
        if building_visible(actor, &building) {
            return Ok(building);
        }

        if actor.role() == Role::Worker {
            let filter = JobFilter {
                worker_id: Some(actor.public_id.clone()),
                building_id: Some(building.public_id.clone()),
                ..Default::default()
            };
            if !self.jobs.list(&filter, Page::new(Some(1), None)).await?.is_empty() {
                return Ok(building);
            }
        }

        Err(OperationError::permission_denied("building belongs to someone else"))
    }

    pub async fn list(
        &self,
        actor: &User,
        filter: BuildingFilter,
        page: Page,
    ) -> OperationResult<Vec<Building>> {
        require_any(actor, &[Permission::ManageBuildings, Permission::ViewOwnBuildings])?;

        let mut filter = filter;
        match actor.role() {
            Role::Admin => {}
            Role::Manager => filter.company_id = Some(manager_company(actor)?),
            _ => filter.owner_id = Some(actor.public_id.clone()),
        }

        Ok(self.buildings.list(&filter, page).await?)
    }

    pub async fn update(
        &self,
        actor: &User,
        public_id: &str,
        request: UpdateBuildingRequest,
    ) -> OperationResult<Building> {
        require_any(actor, &[Permission::ManageBuildings, Permission::ManageOwnBuildings])?;

        let existing = self.require_building(public_id).await?;
        if !building_visible(actor, &existing) {
            return Err(OperationError::permission_denied("building belongs to someone else"));
        }

        if let Some(company_id) = request.company_id.as_deref() {
            match actor.role() {
                Role::Admin => self.require_company(company_id).await?,
                Role::Manager if Some(company_id) == actor.company_id() => {}
                _ => {
                    return Err(OperationError::permission_denied(
                        "cannot move a building to another company",
                    ))
                }
            }
        }

        validate_building_fields(
            request.name.as_deref(),
            request.address.as_deref(),
            request.floors_above,
            request.floors_below,
            request.parking_spaces,
            request.cleaning_areas.as_deref(),
        )?;

        let building = self.buildings.update(public_id, &request).await?;

        let mut touched = vec![existing.company_id.clone(), building.company_id.clone()];
        touched.dedup();
        for company_id in touched.into_iter().flatten() {
            self.companies.refresh_counters(&company_id).await?;
        }

        info!(actor = %actor.public_id, building = %building.public_id, "building updated");
        Ok(building)
    }

    async fn require_building(&self, public_id: &str) -> OperationResult<Building> {
        self.buildings
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("building", public_id))
    }

    async fn require_client(&self, public_id: &str) -> OperationResult<()> {
        match self.users.find_by_public_id(public_id).await? {
            Some(user) if user.role() == Role::Client && user.is_active => Ok(()),
            Some(_) => Err(OperationError::validation("building owner must be an active client")),
            None => Err(OperationError::not_found("user", public_id)),
        }
    }

    async fn require_company(&self, public_id: &str) -> OperationResult<()> {
        match self.companies.find_by_public_id(public_id).await? {
            Some(company) if company.is_active => Ok(()),
            Some(_) => Err(OperationError::validation("company is inactive")),
            None => Err(OperationError::not_found("company", public_id)),
        }
    }
}

fn validate_building_fields(
    name: Option<&str>,
    address: Option<&str>,
    floors_above: Option<i64>,
    floors_below: Option<i64>,
    parking_spaces: Option<i64>,
    cleaning_areas: Option<&[String]>,
) -> OperationResult<()> {
    if let Some(name) = name {
        validate_text("name", name, 100)?;
    }
    if let Some(address) = address {
        validate_text("address", address, 200)?;
    }

    let counts = [
        ("floors_above", floors_above),
        ("floors_below", floors_below),
        ("parking_spaces", parking_spaces),
    ];
    for (field, value) in counts {
        if matches!(value, Some(count) if count < 0) {
            return Err(OperationError::validation(format!("{field} cannot be negative")));
        }
    }

    if let Some(areas) = cleaning_areas {
        for area in areas {
            validate_text("cleaning area", area, 50)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_are_rejected() {
        let result = validate_building_fields(Some("Tower"), Some("Seoul"), Some(-1), None, None, None);
        assert!(matches!(result, Err(OperationError::Validation { message }) if message.contains("floors_above")));
    }

    #[test]
    fn blank_cleaning_areas_are_rejected() {
        let areas = vec!["Lobby".to_string(), " ".to_string()];
        assert!(validate_building_fields(None, None, None, None, None, Some(&areas)).is_err());
        assert!(validate_building_fields(None, None, Some(3), Some(1), Some(0), None).is_ok());
    }
}
