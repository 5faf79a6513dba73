pub mod auth;
pub mod get;
