// handlers/auth/mod.rs - endpoints about the resolved caller

pub mod me;

pub use me::me_get;
