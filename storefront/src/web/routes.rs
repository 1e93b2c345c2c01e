// storefront/src/web/routes.rs

use actix_web::{guard, http::Method, web, Route};

use crate::web::handlers::{admin_handlers, auth_handlers, page_handlers};
use crate::web::middleware::{Access, AccessGuard};

/// One row of the route table: the method and path a handler answers, and the
/// guard in front of it.
pub struct RouteEntry {
  pub method: Method,
  pub path: &'static str,
  pub access: Access,
  pub handler: fn(Route) -> Route,
}

impl RouteEntry {
  fn new(method: Method, path: &'static str, access: Access, handler: fn(Route) -> Route) -> Self {
    Self {
      method,
      path,
      access,
      handler,
    }
  }
}

pub fn route_table() -> Vec<RouteEntry> {
  use Access::*;

  vec![
    // Storefront
    RouteEntry::new(Method::GET, "/", Public, |r| r.to(page_handlers::home_handler)),
    RouteEntry::new(Method::GET, "/product/{sku}", Public, |r| {
      r.to(page_handlers::product_handler)
    }),
    // Authentication
    RouteEntry::new(Method::GET, "/login", Anonymous, |r| {
      r.to(auth_handlers::login_page_handler)
    }),
    RouteEntry::new(Method::POST, "/login", Public, |r| r.to(auth_handlers::login_handler)),
    RouteEntry::new(Method::GET, "/register", Anonymous, |r| {
      r.to(auth_handlers::register_page_handler)
    }),
    RouteEntry::new(Method::POST, "/register", Public, |r| {
      r.to(auth_handlers::register_handler)
    }),
    RouteEntry::new(Method::GET, "/logout", Authenticated, |r| {
      r.to(auth_handlers::logout_handler)
    }),
    // Admin dashboard
    RouteEntry::new(Method::GET, "/admin/dashboard/product/register", Admin, |r| {
      r.to(admin_handlers::product_page_handler)
    }),
    RouteEntry::new(Method::GET, "/admin/dashboard/category/register", Admin, |r| {
      r.to(admin_handlers::category_page_handler)
    }),
    RouteEntry::new(Method::POST, "/admin/category/register", Admin, |r| {
      r.to(admin_handlers::create_category_handler)
    }),
    RouteEntry::new(Method::POST, "/admin/product/register", Admin, |r| {
      r.to(admin_handlers::create_product_handler)
    }),
    RouteEntry::new(Method::POST, "/admin/product/update", Admin, |r| {
      r.to(admin_handlers::update_product_handler)
    }),
  ]
}

// Called from `server::build_app`. Each entry becomes its own resource guarded by
// method, so GET and POST on the same path can carry different access rules.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  for entry in route_table() {
    let route = (entry.handler)(web::route());
    let resource = web::resource(entry.path)
      .guard(guard::Method(entry.method.clone()))
      .route(route);

    match entry.access {
      Access::Public => {
        cfg.service(resource);
      }
      access => {
        cfg.service(resource.wrap(AccessGuard::new(access)));
      }
    }
  }
}
