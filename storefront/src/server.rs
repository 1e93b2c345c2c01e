// storefront/src/server.rs

use actix_files::Files;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{
  body::MessageBody,
  dev::{ServiceFactory, ServiceRequest, ServiceResponse},
  web, App, HttpServer,
};
use std::time::Duration;
use tracing::debug;
use tracing_actix_web::TracingLogger;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::page_handlers::not_found_handler;
use crate::web::middleware::{CsrfProtect, DrainFlash, LoadSession};
use crate::web::routes::configure_app_routes;

// Multipart text fields are small; files are spooled to disk.
const MULTIPART_MEMORY_LIMIT: usize = 1024 * 1024;

fn form_config(limit: usize) -> web::FormConfig {
  web::FormConfig::default().limit(limit).error_handler(|err, req| {
    debug!(error = %err, path = %req.path(), "Form binding failed");
    AppError::Validation("The submitted form is invalid.".to_string()).into()
  })
}

fn multipart_config(limit: usize) -> MultipartFormConfig {
  MultipartFormConfig::default()
    .total_limit(limit)
    .memory_limit(MULTIPART_MEMORY_LIMIT)
    .error_handler(|err, req| {
      debug!(error = %err, path = %req.path(), "Multipart binding failed");
      AppError::Validation("The submitted form is invalid.".to_string()).into()
    })
}

/// Assembles the application: routes, static files and the middleware chain.
///
/// Middleware runs outermost first: request tracing, CSRF, session, flash,
/// then the per-route guard.
pub fn build_app(
  app_state: AppState,
) -> App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
    InitError = (),
  >,
> {
  let max_form_bytes = app_state.config.max_form_bytes;
  let static_dir = app_state.config.static_dir.clone();

  App::new()
    .app_data(web::Data::new(app_state.clone())) // Share AppState with handlers
    .app_data(web::Data::new(app_state.sessions.clone())) // Guards load the session themselves
    .app_data(form_config(max_form_bytes))
    .app_data(multipart_config(max_form_bytes))
    .configure(configure_app_routes)
    .service(Files::new("/static", static_dir))
    .default_service(web::to(not_found_handler))
    .wrap(DrainFlash::new(app_state.flashes.clone()))
    .wrap(LoadSession::new(app_state.sessions.clone()))
    .wrap(CsrfProtect::new(app_state.csrf.clone()))
    .wrap(TracingLogger::default()) // Actix middleware for tracing requests
}

/// Binds and runs the server until it is shut down.
pub async fn run(app_state: AppState) -> std::io::Result<()> {
  let config = app_state.config.clone();
  let server_address = config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || build_app(app_state.clone()))
    .client_request_timeout(Duration::from_secs(config.server_request_timeout_secs))
    .client_disconnect_timeout(Duration::from_secs(config.server_disconnect_timeout_secs))
    .bind(&server_address)?
    .run()
    .await
}
