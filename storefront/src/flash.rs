// storefront/src/flash.rs

//! One-shot notifications carried to the next page load in an encrypted cookie.

use actix_web::cookie::{Cookie, Key};
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use futures_util::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::{EncryptedCookie, SessionError};

pub const FLASH_COOKIE_NAME: &str = "flash_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
  Success,
  Error,
  Warning,
  Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashMessage {
  pub id: Uuid,
  #[serde(rename = "type")]
  pub kind: FlashKind,
  pub created_at: DateTime<Utc>,
  pub message: String,
}

impl FlashMessage {
  pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      kind,
      created_at: Utc::now(),
      message: message.into(),
    }
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self::new(FlashKind::Success, message)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(FlashKind::Error, message)
  }
}

#[derive(Clone)]
pub struct FlashStore {
  cookie: EncryptedCookie,
}

impl FlashStore {
  pub fn new(key: Key, secure: bool) -> Self {
    Self {
      cookie: EncryptedCookie::new(FLASH_COOKIE_NAME, key, secure),
    }
  }

  pub fn cookie_name(&self) -> &str {
    self.cookie.name()
  }

  /// Reads the queued messages in order. Entries that do not decode as a flash
  /// message are dropped.
  pub fn drain(&self, req: &HttpRequest) -> Result<Vec<FlashMessage>, SessionError> {
    let entries: Vec<serde_json::Value> = self.cookie.read(req)?.unwrap_or_default();
    Ok(
      entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<FlashMessage>(entry).ok())
        .collect(),
    )
  }

  /// Cookie queueing `messages` for the next request.
  pub fn queue(&self, messages: &[FlashMessage]) -> Result<Cookie<'static>, SessionError> {
    self.cookie.write(&messages, None)
  }

  pub fn cleared(&self) -> Cookie<'static> {
    self.cookie.expired()
  }
}

/// Messages drained for the current request, in the order they were queued.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlashMessages(pub Vec<FlashMessage>);

impl FromRequest for FlashMessages {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Ok(req.extensions().get::<FlashMessages>().cloned().unwrap_or_default()))
  }
}
