//! Shared types for the user management crate.

pub mod errors;
pub mod requests;

pub use errors::{UserError, UserResult};
pub use requests::{CreateAccountRequest, RegisterClientRequest};
