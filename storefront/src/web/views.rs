// storefront/src/web/views.rs

//! Page rendering. Templates are compiled into the binary and loaded once.

use actix_web::{
  http::{header, StatusCode},
  HttpResponse, HttpResponseBuilder,
};
use serde::Serialize;
use tera::{Context, Tera};

use crate::errors::Result;
use crate::flash::FlashMessages;
use crate::session::AppContext;
use crate::web::middleware::CsrfToken;

const TEMPLATES: &[(&str, &str)] = &[
  ("base.html", include_str!("../../templates/base.html")),
  ("home.html", include_str!("../../templates/home.html")),
  ("product.html", include_str!("../../templates/product.html")),
  ("login.html", include_str!("../../templates/login.html")),
  ("register.html", include_str!("../../templates/register.html")),
  ("error.html", include_str!("../../templates/error.html")),
  (
    "admin/product_register.html",
    include_str!("../../templates/admin/product_register.html"),
  ),
  (
    "admin/category_register.html",
    include_str!("../../templates/admin/category_register.html"),
  ),
];

pub fn load_templates() -> std::result::Result<Tera, tera::Error> {
  let mut tera = Tera::default();
  tera.add_raw_templates(TEMPLATES.iter().copied())?;
  tracing::debug!(count = TEMPLATES.len(), "Page templates compiled.");
  Ok(tera)
}

/// Values every page receives.
pub struct Page {
  context: Context,
  no_store: bool,
}

impl Page {
  pub fn new(title: &str, app: &AppContext, flashes: &FlashMessages) -> Self {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("app", app);
    context.insert("flashes", flashes);
    Self {
      context,
      no_store: false,
    }
  }

  /// Form pages carry the CSRF token and must not be cached.
  pub fn with_csrf(mut self, token: &CsrfToken) -> Self {
    self.context.insert("csrf_token", token.as_str());
    self.no_store = true;
    self
  }

  pub fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
    self.context.insert(key, value);
    self
  }

  pub fn render(self, tera: &Tera, template: &str) -> Result<HttpResponse> {
    self.render_with_status(tera, template, StatusCode::OK)
  }

  pub fn render_with_status(self, tera: &Tera, template: &str, status: StatusCode) -> Result<HttpResponse> {
    let html = tera.render(template, &self.context)?;
    let mut response = HttpResponse::build(status);
    response.content_type("text/html; charset=utf-8");
    if self.no_store {
      response.insert_header((header::CACHE_CONTROL, "no-store"));
    }
    Ok(response.body(html))
  }
}

/// 303 redirect used after form submissions. Callers attach cookies before finishing.
pub fn see_other(location: &str) -> HttpResponseBuilder {
  let mut builder = HttpResponse::SeeOther();
  builder.insert_header((header::LOCATION, location.to_string()));
  builder
}
