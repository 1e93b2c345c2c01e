// storefront/src/api/mod.rs

//! Client for the backend REST API.
//!
//! Every call is a free function taking the API base URL explicitly, builds a
//! fresh `reqwest::Client`, and maps any status outside `[200, 300)` to
//! [`ApiError::Status`] carrying the response body. Nothing is retried.

pub mod auth;
pub mod categories;
pub mod products;

pub use auth::{login, register};
pub use categories::{create_category, get_all_categories};
pub use products::{
  create_product, get_product_by_sku, get_products, update_product, upload_product_images, ImageUpload,
};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to the login and register calls. Other calls rely on the
/// inbound request's lifetime.
pub const AUTH_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("base URL is required")]
  MissingBaseUrl,

  #[error("invalid {op} URL '{url}': {reason}")]
  InvalidUrl {
    op: &'static str,
    url: String,
    reason: String,
  },

  #[error("build {op} client: {source}")]
  Client {
    op: &'static str,
    #[source]
    source: reqwest::Error,
  },

  #[error("send {op} request: {source}")]
  Transport {
    op: &'static str,
    #[source]
    source: reqwest::Error,
  },

  #[error("{op} failed ({status}): {body}")]
  Status { op: &'static str, status: u16, body: String },

  #[error("decode {op} response: {source}")]
  Decode {
    op: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("add product images completed with errors: {}", .failures.join("; "))]
  ImageUpload { failures: Vec<String> },
}

impl ApiError {
  /// HTTP status returned by the backend, if the failure came from one.
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

/// Joins the base URL and an endpoint path, rejecting blank base URLs before any
/// network activity happens.
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<String, ApiError> {
  if base_url.trim().is_empty() {
    return Err(ApiError::MissingBaseUrl);
  }
  Ok(format!("{}{}", base_url.trim_end_matches('/'), path))
}

pub(crate) fn client(op: &'static str, timeout: Option<Duration>) -> Result<reqwest::Client, ApiError> {
  let mut builder = reqwest::Client::builder();
  if let Some(timeout) = timeout {
    builder = builder.timeout(timeout);
  }
  builder.build().map_err(|source| ApiError::Client { op, source })
}

/// Reads the whole response body and fails on non-2xx statuses.
pub(crate) async fn read_body(op: &'static str, response: reqwest::Response) -> Result<Bytes, ApiError> {
  let status = response.status();
  let body = response
    .bytes()
    .await
    .map_err(|source| ApiError::Transport { op, source })?;

  if !status.is_success() {
    let text = String::from_utf8_lossy(&body).trim().to_string();
    tracing::warn!(op, status = status.as_u16(), "Backend API returned a failure status");
    return Err(ApiError::Status {
      op,
      status: status.as_u16(),
      body: text,
    });
  }
  Ok(body)
}

pub(crate) fn decode<T: DeserializeOwned>(op: &'static str, body: &[u8]) -> Result<T, ApiError> {
  serde_json::from_slice(body).map_err(|source| ApiError::Decode { op, source })
}

/// Sends a prepared request and decodes the JSON body of a successful response.
pub(crate) async fn send_json<T: DeserializeOwned>(
  op: &'static str,
  request: reqwest::RequestBuilder,
) -> Result<T, ApiError> {
  let response = request
    .send()
    .await
    .map_err(|source| ApiError::Transport { op, source })?;
  let body = read_body(op, response).await?;
  decode(op, &body)
}
