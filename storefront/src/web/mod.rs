// storefront/src/web/mod.rs
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod views;
