//! Cleaning companies and their manager signup.

use cleanit_auth::{AuthError, Authenticator, NewAccount};
use cleanit_config::AuthConfig;
use cleanit_database::{
    Company, CompanyRepository, DatabaseError, ManagerProfile, Page, Role, RoleProfile,
    SqlitePool, User,
};
use cleanit_users::utils::validation::{
    validate_business_number, validate_email, validate_login_id, validate_name,
    validate_password, validate_phone, validate_text,
};
use cleanit_users::Permission;
use tracing::info;

use super::access::{manager_company, require};
use crate::types::{NewCompany, OperationError, OperationResult};

#[derive(Clone)]
pub struct CompanyService {
    companies: CompanyRepository,
    auth: Authenticator,
}

impl CompanyService {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        Self {
            companies: CompanyRepository::new(pool.clone()),
            auth: Authenticator::new(pool, config),
        }
    }

    /// Create a company together with its first manager. Both rows are written
    /// in one transaction; neither exists if either insert fails.
    pub async fn create_with_manager(
        &self,
        actor: &User,
        input: NewCompany,
    ) -> OperationResult<(Company, User)> {
        require(actor, Permission::ManageCompanies)?;

        let NewCompany { company, manager } = input;

        validate_text("company name", &company.name, 100)?;
        if let Some(number) = company.business_number.as_deref() {
            validate_business_number(number)?;
        }
        if let Some(phone) = company.phone.as_deref() {
            validate_phone(phone)?;
        }

        validate_login_id(&manager.login_id)?;
        validate_password(&manager.password)?;
        validate_name(&manager.name)?;
        if let Some(phone) = manager.phone.as_deref() {
            validate_phone(phone)?;
        }
        if let Some(email) = manager.contact_email.as_deref() {
            validate_email(email)?;
        }

        let account = NewAccount {
            login_id: manager.login_id,
            password: manager.password,
            name: manager.name,
            phone: manager.phone,
            contact_email: manager.contact_email,
            address: None,
            // Replaced with the new company's id inside the transaction.
            profile: RoleProfile::Manager(ManagerProfile {
                company_id: String::new(),
                department: manager.department,
                position: manager.position,
            }),
            is_verified: true,
        };

        let user_request = self.auth.prepare_account(account).await.map_err(login_conflict)?;

        let (company, manager) = self
            .companies
            .create_with_manager(&company, &user_request)
            .await
            .map_err(|error| match error {
                DatabaseError::Duplicate(_) => login_conflict(AuthError::LoginIdTaken),
                other => OperationError::from(other),
            })?;

        info!(
            actor = %actor.public_id,
            company = %company.public_id,
            manager = %manager.public_id,
            "company created"
        );
        Ok((company, manager))
    }

    /// Managers only see their own company.
    pub async fn get(&self, actor: &User, public_id: &str) -> OperationResult<Company> {
        require(actor, Permission::ViewCompany)?;

        if actor.role() == Role::Manager && manager_company(actor)? != public_id {
            return Err(OperationError::permission_denied("company belongs to someone else"));
        }

        self.companies
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("company", public_id))
    }

    pub async fn list(
        &self,
        actor: &User,
        include_inactive: bool,
        page: Page,
    ) -> OperationResult<Vec<Company>> {
        require(actor, Permission::ViewCompany)?;

        if actor.role() == Role::Manager {
            let company = self.get(actor, &manager_company(actor)?).await?;
            return Ok(vec![company]);
        }

        Ok(self.companies.list(include_inactive, page).await?)
    }

    pub async fn set_active(
        &self,
        actor: &User,
        public_id: &str,
        is_active: bool,
    ) -> OperationResult<Company> {
        require(actor, Permission::ManageCompanies)?;

        let company = self.companies.set_active(public_id, is_active).await?;
        info!(actor = %actor.public_id, company = %company.public_id, is_active, "company activation changed");
        Ok(company)
    }
}

fn login_conflict(error: AuthError) -> OperationError {
    match error {
        AuthError::LoginIdTaken => OperationError::Conflict {
            message: AuthError::LoginIdTaken.to_string(),
        },
        AuthError::Database(error) => OperationError::from(error),
        other => OperationError::validation(other.to_string()),
    }
}
