// handlers/public/mod.rs - endpoints that never look at the caller

pub mod health;
pub mod root;

pub use health::health_get;
pub use root::root_get;
