// storefront/src/lib.rs

//! Server-rendered storefront backed by a separate REST API.

pub mod api;
pub mod config;
pub mod errors;
pub mod flash;
pub mod models;
pub mod server;
pub mod session;
pub mod state;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
