// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/";
pub const DEFAULT_SESSION_KEY: &str = "storefront-session-key-placeholder-change-me";
pub const DEFAULT_CSRF_KEY: &str = "storefront-csrf-key-placeholder-change-me";

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub server_request_timeout_secs: u64,
  pub server_disconnect_timeout_secs: u64,

  // Backend REST API all data flows through
  pub api_url: String,

  pub session_auth_key: String,
  pub session_enc_key: String,
  pub session_cookie_secure: bool,

  pub csrf_token_key: String,
  pub csrf_cookie_secure: bool,
  pub csrf_trusted_origins: Vec<String>,

  pub static_dir: String,
  pub max_form_bytes: usize,
  pub log_json: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let config = Self::from_vars(|name| env::var(name).ok())?;
    tracing::info!("Application configuration loaded successfully.");
    Ok(config)
  }

  /// Builds the configuration from an arbitrary variable source. `from_env` is the
  /// process-environment flavour of this.
  pub fn from_vars<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "0.0.0.0");
    let server_port = parse_var(&lookup, "SERVER_PORT", 9090u16)?;
    let server_request_timeout_secs = parse_var(&lookup, "SERVER_REQUEST_TIMEOUT_SECS", 1u64)?;
    let server_disconnect_timeout_secs = parse_var(&lookup, "SERVER_DISCONNECT_TIMEOUT_SECS", 10u64)?;

    let api_url = get_or("API_URL", DEFAULT_API_URL);

    let session_auth_key = get_or("SESSION_AUTH_KEY", DEFAULT_SESSION_KEY);
    let session_enc_key = get_or("SESSION_ENC_KEY", DEFAULT_SESSION_KEY);
    let session_cookie_secure = parse_bool_var(&lookup, "SESSION_COOKIE_SECURE", true)?;

    let csrf_token_key = get_or("CSRF_TOKEN_KEY", DEFAULT_CSRF_KEY);
    let csrf_cookie_secure = parse_bool_var(&lookup, "CSRF_COOKIE_SECURE", false)?;
    let csrf_trusted_origins = parse_origin_list(&get_or("CSRF_TRUSTED_ORIGINS", ""));

    let static_dir = get_or("STATIC_DIR", "static");
    let max_form_bytes = parse_var(&lookup, "MAX_FORM_BYTES", 32 * 1024 * 1024usize)?;
    let log_json = parse_bool_var(&lookup, "LOG_JSON", false)?;

    Ok(Self {
      server_host,
      server_port,
      server_request_timeout_secs,
      server_disconnect_timeout_secs,
      api_url,
      session_auth_key,
      session_enc_key,
      session_cookie_secure,
      csrf_token_key,
      csrf_cookie_secure,
      csrf_trusted_origins,
      static_dir,
      max_form_bytes,
      log_json,
    })
  }

  /// Names of the secrets still set to their built-in placeholder values.
  pub fn placeholder_secrets(&self) -> Vec<&'static str> {
    let mut names = Vec::new();
    if self.session_auth_key == DEFAULT_SESSION_KEY {
      names.push("SESSION_AUTH_KEY");
    }
    if self.session_enc_key == DEFAULT_SESSION_KEY {
      names.push("SESSION_ENC_KEY");
    }
    if self.csrf_token_key == DEFAULT_CSRF_KEY {
      names.push("CSRF_TOKEN_KEY");
    }
    names
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("server_request_timeout_secs", &self.server_request_timeout_secs)
      .field("server_disconnect_timeout_secs", &self.server_disconnect_timeout_secs)
      .field("api_url", &self.api_url)
      .field("session_auth_key", &"[REDACTED]")
      .field("session_enc_key", &"[REDACTED]")
      .field("session_cookie_secure", &self.session_cookie_secure)
      .field("csrf_token_key", &"[REDACTED]")
      .field("csrf_cookie_secure", &self.csrf_cookie_secure)
      .field("csrf_trusted_origins", &self.csrf_trusted_origins)
      .field("static_dir", &self.static_dir)
      .field("max_form_bytes", &self.max_form_bytes)
      .field("log_json", &self.log_json)
      .finish()
  }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: fmt::Display,
{
  match lookup(name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
    None => Ok(default),
  }
}

fn parse_bool_var<F>(lookup: &F, name: &str, default: bool) -> Result<bool>
where
  F: Fn(&str) -> Option<String>,
{
  match lookup(name) {
    Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
      "1" | "t" | "true" | "yes" | "on" => Ok(true),
      "0" | "f" | "false" | "no" | "off" => Ok(false),
      _ => Err(AppError::Config(format!("Invalid {} value '{}': expected a boolean", name, raw))),
    },
    None => Ok(default),
  }
}

/// Splits a comma-separated origin list, dropping blank entries.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|origin| !origin.is_empty())
    .map(str::to_string)
    .collect()
}
