pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod discord;
pub mod error;
pub mod extractor;
pub mod providers;
pub mod quota;
pub mod routes;
pub mod translations;

pub use routes::{api_routes, AppServices};
