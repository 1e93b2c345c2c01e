// storefront/src/web/handlers/page_handlers.rs

use actix_web::{http::StatusCode, web, HttpResponse};
use tracing::{info, instrument, warn};

use crate::api;
use crate::errors::AppError;
use crate::flash::FlashMessages;
use crate::session::AppContext;
use crate::state::AppState;
use crate::web::views::Page;

#[instrument(name = "handler::home", skip_all, fields(user_id = ctx.user_id))]
pub async fn home_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
) -> Result<HttpResponse, AppError> {
  let products = api::get_products(app_state.api_url()).await?;
  info!(count = products.data.len(), "Rendering home page.");

  Page::new("Storefront - Home", &ctx, &flashes)
    .insert("products", &products.data)
    .insert("meta", &products.meta)
    .render(&app_state.templates, "home.html")
}

#[instrument(name = "handler::product", skip(app_state, ctx, flashes))]
pub async fn product_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
  sku: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  match api::get_product_by_sku(app_state.api_url(), &sku).await {
    Ok(product) => Page::new("Storefront - Product", &ctx, &flashes)
      .insert("product", &product.data)
      .render(&app_state.templates, "product.html"),
    Err(e) => {
      warn!(error = %e, sku = %sku, "Product lookup failed; rendering not-found page");
      Page::new("Storefront - Product not found", &ctx, &flashes)
        .insert("error_title", "This product does not exist or was removed")
        .insert("error_message", "We could not find the product you are looking for.")
        .render_with_status(&app_state.templates, "error.html", StatusCode::NOT_FOUND)
    }
  }
}

/// Fallback for paths no route matches.
pub async fn not_found_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
) -> Result<HttpResponse, AppError> {
  Page::new("Storefront - Not found", &ctx, &flashes)
    .insert("error_title", "Page not found")
    .insert("error_message", "The page you are looking for does not exist.")
    .render_with_status(&app_state.templates, "error.html", StatusCode::NOT_FOUND)
}
