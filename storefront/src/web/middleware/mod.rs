// storefront/src/web/middleware/mod.rs

//! Request pipeline wrapped around every route:
//! CSRF check → session load → flash drain → per-route access guard.

pub mod csrf;
pub mod flash;
pub mod guards;
pub mod session;

pub use csrf::{CsrfProtect, CsrfSettings, CsrfToken};
pub use flash::DrainFlash;
pub use guards::{Access, AccessGuard};
pub use session::LoadSession;

/// Static assets skip session and flash handling.
pub fn is_static_path(path: &str) -> bool {
  path == "/static" || path.starts_with("/static/")
}
