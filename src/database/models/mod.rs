pub mod user;

pub use user::{SubscriptionStatus, User, UserRole, UserRow};
