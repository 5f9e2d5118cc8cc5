// handlers/mod.rs
//
// Public (no caller needed) -> auth (caller required) -> operations (admin
// guard inside the service layer).
pub mod auth;
pub mod operations;
pub mod public;
