// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result;
use crate::flash::FlashStore;
use crate::session::keys::{cookie_key, csrf_key};
use crate::session::SessionStore;
use crate::web::middleware::CsrfSettings;
use crate::web::views;
use std::sync::Arc;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>, // Share loaded config
  pub templates: Arc<Tera>,
  pub sessions: SessionStore,
  pub flashes: FlashStore,
  pub csrf: CsrfSettings,
}

impl AppState {
  /// Derives cookie keys and compiles the page templates. Called once at startup.
  pub fn new(config: AppConfig) -> Result<Self> {
    let key = cookie_key(&config.session_auth_key, &config.session_enc_key);
    let sessions = SessionStore::new(key.clone(), config.session_cookie_secure);
    let flashes = FlashStore::new(key, config.session_cookie_secure);
    let csrf = CsrfSettings::new(
      csrf_key(&config.csrf_token_key),
      config.csrf_cookie_secure,
      config.csrf_trusted_origins.clone(),
      config.max_form_bytes,
    );
    let templates = views::load_templates()?;

    Ok(Self {
      config: Arc::new(config),
      templates: Arc::new(templates),
      sessions,
      flashes,
      csrf,
    })
  }

  pub fn api_url(&self) -> &str {
    &self.config.api_url
  }
}
