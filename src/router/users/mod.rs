//! Users-related HTTP API.
pub mod account;
pub mod get;
pub mod list;
pub mod password;
pub mod profile;
