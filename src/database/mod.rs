pub mod manager;
pub mod memory;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod user_repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryUserStore;
pub use user_repository::PgUserRepository;
