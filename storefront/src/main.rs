// storefront/src/main.rs

use anyhow::Context;
use storefront::{server, AppConfig, AppState};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn init_tracing(json: bool) {
  // RUST_LOG overrides the default level
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration

  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Config is read before the subscriber exists so LOG_JSON can pick the format.
  let app_config = AppConfig::from_env().context("Failed to load application configuration")?;
  init_tracing(app_config.log_json);

  tracing::info!("Starting storefront server...");
  tracing::debug!(config = ?app_config, "Loaded configuration");

  for name in app_config.placeholder_secrets() {
    tracing::warn!(variable = name, "Using the built-in placeholder secret; set it before deploying");
  }

  let app_state = AppState::new(app_config).context("Failed to initialise application state")?;
  tracing::info!(api_url = %app_state.api_url(), "Application state ready.");

  server::run(app_state).await.context("HTTP server failed")?;
  Ok(())
}
