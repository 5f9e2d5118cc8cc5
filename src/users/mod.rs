//! Admin user management: listing users and changing their roles.

pub mod args;
pub mod error;
pub mod rules;
pub mod service;
pub mod store;

pub use args::{GetPaginatedUsersArgs, UpdateUserAdminArgs, UpdateUserRoleArgs, UserFilter, PAGE_SIZE};
pub use error::UserError;
pub use rules::RoleChange;
pub use service::{PaginatedUsers, UserService};
pub use store::{UserPage, UserStore};
