//! User service for account operations.

use cleanit_auth::{AuthSession, Authenticator, NewAccount};
use cleanit_config::AuthConfig;
use cleanit_database::{
    CompanyRepository, DatabaseError, Page, Role, RoleProfile, SqlitePool, UpdateUserRequest,
    User, UserFilter, UserRepository,
};
use tracing::{info, warn};

use crate::permissions::{has_permission, Permission, PermissionChecker};
use crate::types::{CreateAccountRequest, RegisterClientRequest, UserError, UserResult};
use crate::utils::validation::{
    validate_business_number, validate_email, validate_login_id, validate_name,
    validate_password, validate_phone,
};

/// Service for managing accounts and sign-in
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    companies: CompanyRepository,
    auth: Authenticator,
}

impl UserService {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            auth: Authenticator::new(pool, config),
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// Client self-registration. The account stays unverified until an admin verifies it.
    pub async fn register_client(&self, request: RegisterClientRequest) -> UserResult<User> {
        validate_account_fields(
            &request.login_id,
            &request.password,
            &request.name,
            request.phone.as_deref(),
            request.contact_email.as_deref(),
        )?;
        if let Some(number) = request.profile.business_number.as_deref() {
            validate_business_number(number)?;
        }

        let user = self
            .auth
            .register(NewAccount {
                login_id: request.login_id,
                password: request.password,
                name: request.name,
                phone: request.phone,
                contact_email: request.contact_email,
                address: request.address,
                profile: RoleProfile::Client(request.profile),
                is_verified: false,
            })
            .await?;

        Ok(user)
    }

    /// Open an account of any role on behalf of an administrator.
    pub async fn create_account(&self, actor: &User, request: CreateAccountRequest) -> UserResult<User> {
        PermissionChecker::require(actor.role(), Permission::ManageUsers)?;

        validate_account_fields(
            &request.login_id,
            &request.password,
            &request.name,
            request.phone.as_deref(),
            request.contact_email.as_deref(),
        )?;
        validate_profile(&request.profile)?;
        self.require_company(&request.profile).await?;

        let user = self
            .auth
            .register(NewAccount {
                login_id: request.login_id,
                password: request.password,
                name: request.name,
                phone: request.phone,
                contact_email: request.contact_email,
                address: request.address,
                profile: request.profile,
                is_verified: true,
            })
            .await?;
        self.refresh_company(user.company_id()).await?;

        info!(actor = %actor.public_id, user = %user.public_id, role = %user.role(), "account created by admin");
        Ok(user)
    }

    pub async fn sign_in(&self, login_id: &str, password: &str) -> UserResult<(User, AuthSession)> {
        Ok(self.auth.login(login_id, password).await?)
    }

    pub async fn authenticate(&self, token: &str) -> UserResult<User> {
        let (user, _) = self.auth.authenticate_token(token).await?;
        Ok(user)
    }

    pub async fn sign_out(&self, token: &str) -> UserResult<()> {
        Ok(self.auth.logout(token).await?)
    }

    /// Users may read themselves; anyone else needs `manage_users`.
    pub async fn get_user(&self, actor: &User, public_id: &str) -> UserResult<User> {
        if actor.public_id != public_id {
            PermissionChecker::require(actor.role(), Permission::ManageUsers)?;
        }

        self.users
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| UserError::NotFound(public_id.to_string()))
    }

    pub async fn list_users(&self, actor: &User, filter: &UserFilter, page: Page) -> UserResult<Vec<User>> {
        PermissionChecker::require(actor.role(), Permission::ManageUsers)?;
        Ok(self.users.list(filter, page).await?)
    }

    /// Users may edit their own contact fields. Profile changes need `manage_users`.
    pub async fn update_user(
        &self,
        actor: &User,
        public_id: &str,
        request: UpdateUserRequest,
    ) -> UserResult<User> {
        let is_admin = has_permission(actor.role(), Permission::ManageUsers);

        if actor.public_id != public_id && !is_admin {
            return Err(UserError::permission_denied("cannot edit another user"));
        }
        if request.profile.is_some() && !is_admin {
            return Err(UserError::permission_denied("profile changes need manage_users"));
        }

        if let Some(name) = request.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(phone) = request.phone.as_deref() {
            validate_phone(phone)?;
        }
        if let Some(email) = request.contact_email.as_deref() {
            validate_email(email)?;
        }
        let previous_company = match &request.profile {
            Some(profile) => {
                validate_profile(profile)?;
                self.require_company(profile).await?;
                self.get_user(actor, public_id)
                    .await?
                    .company_id()
                    .map(str::to_string)
            }
            None => None,
        };

        let user = self.users.update(public_id, &request).await.map_err(|error| match error {
            DatabaseError::Conflict(message) => UserError::validation(message),
            other => UserError::from(other),
        })?;

        if request.profile.is_some() {
            self.refresh_company(user.company_id()).await?;
            if previous_company.as_deref() != user.company_id() {
                self.refresh_company(previous_company.as_deref()).await?;
            }
        }

        info!(actor = %actor.public_id, user = %user.public_id, "user updated");
        Ok(user)
    }

    pub async fn set_verified(&self, actor: &User, public_id: &str, is_verified: bool) -> UserResult<User> {
        PermissionChecker::require(actor.role(), Permission::ManageUsers)?;

        let user = self.users.set_verified(public_id, is_verified).await?;
        info!(actor = %actor.public_id, user = %user.public_id, is_verified, "verification changed");
        Ok(user)
    }

    /// Deactivating an account also ends its sessions.
    pub async fn set_active(&self, actor: &User, public_id: &str, is_active: bool) -> UserResult<User> {
        PermissionChecker::require(actor.role(), Permission::ManageUsers)?;

        if actor.public_id == public_id && !is_active {
            return Err(UserError::validation("cannot deactivate your own account"));
        }

        let user = self.users.set_active(public_id, is_active).await?;
        self.refresh_company(user.company_id()).await?;
        if !is_active {
            let revoked = self.auth.revoke_sessions(user.id).await?;
            warn!(actor = %actor.public_id, user = %user.public_id, revoked, "account deactivated");
        } else {
            info!(actor = %actor.public_id, user = %user.public_id, "account activated");
        }

        Ok(user)
    }

    /// Account totals per role, for the admin dashboard.
    pub async fn role_counts(&self, actor: &User) -> UserResult<Vec<(Role, i64)>> {
        PermissionChecker::require(actor.role(), Permission::ViewReports)?;
        Ok(self.users.count_by_role().await?)
    }

    /// Workers and managers may only be attached to an existing company.
    async fn require_company(&self, profile: &RoleProfile) -> UserResult<()> {
        let Some(company_id) = profile.company_id() else {
            return Ok(());
        };

        match self.companies.find_by_public_id(company_id).await? {
            Some(company) if company.is_active => Ok(()),
            Some(_) => Err(UserError::validation(format!("Company {company_id} is inactive"))),
            None => Err(UserError::validation(format!("Company {company_id} does not exist"))),
        }
    }

    /// Keep the company's worker counter in step with account writes.
    async fn refresh_company(&self, company_id: Option<&str>) -> UserResult<()> {
        if let Some(company_id) = company_id {
            self.companies.refresh_counters(company_id).await?;
        }
        Ok(())
    }
}

fn validate_account_fields(
    login_id: &str,
    password: &str,
    name: &str,
    phone: Option<&str>,
    contact_email: Option<&str>,
) -> UserResult<()> {
    validate_login_id(login_id)?;
    validate_password(password)?;
    validate_name(name)?;
    if let Some(phone) = phone {
        validate_phone(phone)?;
    }
    if let Some(email) = contact_email {
        validate_email(email)?;
    }
    Ok(())
}

fn validate_profile(profile: &RoleProfile) -> UserResult<()> {
    match profile {
        RoleProfile::Manager(manager) if manager.company_id.trim().is_empty() => {
            Err(UserError::validation("Managers must belong to a company"))
        }
        RoleProfile::Worker(worker) => match worker.hourly_rate {
            Some(rate) if rate < 0.0 => Err(UserError::validation("Hourly rate cannot be negative")),
            _ => Ok(()),
        },
        RoleProfile::Client(client) => match client.business_number.as_deref() {
            Some(number) => validate_business_number(number),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}
