pub mod migrate;
pub mod token;
pub mod users;
