//! # CleanIT Users Crate
//!
//! Accounts, sign-in and the role/permission table.
//!
//! - **permissions**: the static role/permission table, main screens and checks
//! - **services**: account registration, administration and sessions
//! - **types**: inputs and errors
//! - **utils**: input validation

pub mod permissions;
pub mod services;
pub mod types;
pub mod utils;

pub use cleanit_database::{Role, RoleProfile, UpdateUserRequest, User, UserFilter};
pub use permissions::{
    can_access_admin_ui, has_all_permissions, has_any_permission, has_permission, main_screen,
    main_screen_for_name, permissions_for, permissions_for_name, MainScreen, Permission,
    PermissionChecker,
};
pub use services::UserService;
pub use types::{CreateAccountRequest, RegisterClientRequest, UserError, UserResult};
