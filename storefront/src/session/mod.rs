// storefront/src/session/mod.rs

//! Authenticated identity kept in an encrypted cookie, and the per-request
//! context handlers derive from it.

pub mod keys;

use actix_web::cookie::{time::Duration, Cookie, CookieJar, Key, SameSite};
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;

pub const SESSION_COOKIE_NAME: &str = "auth_session";
pub const ADMIN_ROLE: &str = "admin";

/// Lifetime of a regular login session.
pub const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;
/// Lifetime when the user asked to be remembered.
pub const EXTENDED_SESSION_MAX_AGE_SECS: i64 = SESSION_MAX_AGE_SECS * 2;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("cookie '{0}' failed verification")]
  Tampered(String),

  #[error("cookie '{name}' holds an unreadable record: {source}")]
  Decode {
    name: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("could not encode the record for cookie '{name}': {source}")]
  Encode {
    name: String,
    #[source]
    source: serde_json::Error,
  },
}

/// The identity stored in the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
  pub user_id: i64,
  pub email: String,
  pub token: String,
  pub authenticated: bool,
  pub role: String,
}

/// Reads and writes one encrypted cookie holding a JSON-encoded record.
#[derive(Clone)]
pub struct EncryptedCookie {
  name: String,
  key: Key,
  secure: bool,
}

impl EncryptedCookie {
  pub fn new(name: impl Into<String>, key: Key, secure: bool) -> Self {
    Self {
      name: name.into(),
      key,
      secure,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Decrypts the cookie carried by `req`. Absent or empty cookies yield `None`.
  pub fn read<T>(&self, req: &HttpRequest) -> Result<Option<T>, SessionError>
  where
    T: for<'de> Deserialize<'de>,
  {
    let raw = match req.cookie(&self.name) {
      Some(raw) if !raw.value().is_empty() => raw,
      _ => return Ok(None),
    };

    let mut jar = CookieJar::new();
    jar.add_original(raw);
    let plain = jar
      .private(&self.key)
      .get(&self.name)
      .ok_or_else(|| SessionError::Tampered(self.name.clone()))?;

    serde_json::from_str(plain.value())
      .map(Some)
      .map_err(|source| SessionError::Decode {
        name: self.name.clone(),
        source,
      })
  }

  /// Encrypts `value` into a cookie. `max_age` of `None` makes a browser-session cookie.
  pub fn write<T: Serialize>(&self, value: &T, max_age: Option<Duration>) -> Result<Cookie<'static>, SessionError> {
    let plain = serde_json::to_string(value).map_err(|source| SessionError::Encode {
      name: self.name.clone(),
      source,
    })?;

    let mut builder = Cookie::build(self.name.clone(), plain)
      .path("/")
      .http_only(true)
      .secure(self.secure)
      .same_site(SameSite::Lax);
    if let Some(max_age) = max_age {
      builder = builder.max_age(max_age);
    }

    let mut jar = CookieJar::new();
    jar.private_mut(&self.key).add(builder.finish());
    jar
      .get(&self.name)
      .cloned()
      .ok_or_else(|| SessionError::Tampered(self.name.clone()))
  }

  /// Cookie that makes the browser drop the stored one: empty value, negative max-age.
  pub fn expired(&self) -> Cookie<'static> {
    Cookie::build(self.name.clone(), "")
      .path("/")
      .http_only(true)
      .secure(self.secure)
      .same_site(SameSite::Lax)
      .max_age(Duration::seconds(-1))
      .finish()
  }
}

/// Issues, loads and invalidates the session cookie.
#[derive(Clone)]
pub struct SessionStore {
  cookie: EncryptedCookie,
}

impl SessionStore {
  pub fn new(key: Key, secure: bool) -> Self {
    Self {
      cookie: EncryptedCookie::new(SESSION_COOKIE_NAME, key, secure),
    }
  }

  pub fn load(&self, req: &HttpRequest) -> Result<Option<SessionIdentity>, SessionError> {
    self.cookie.read(req)
  }

  pub fn issue(&self, identity: &SessionIdentity, extend: bool) -> Result<Cookie<'static>, SessionError> {
    let max_age = if extend {
      EXTENDED_SESSION_MAX_AGE_SECS
    } else {
      SESSION_MAX_AGE_SECS
    };
    self.cookie.write(identity, Some(Duration::seconds(max_age)))
  }

  pub fn invalidate(&self) -> Cookie<'static> {
    self.cookie.expired()
  }
}

/// Read-only view of the caller handed to handlers and templates.
///
/// Inserted into request extensions by the session middleware; requests that
/// bypassed it (static assets) extract as anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppContext {
  pub user_id: i64,
  pub email: String,
  #[serde(skip_serializing)]
  pub token: String,
  pub is_authenticated: bool,
  pub role: String,
  pub path: String,
}

impl AppContext {
  pub fn anonymous(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      ..Self::default()
    }
  }

  pub fn from_identity(identity: SessionIdentity, path: impl Into<String>) -> Self {
    Self {
      user_id: identity.user_id,
      email: identity.email,
      token: identity.token,
      is_authenticated: identity.authenticated,
      role: identity.role,
      path: path.into(),
    }
  }
}

impl FromRequest for AppContext {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let ctx = req
      .extensions()
      .get::<AppContext>()
      .cloned()
      .unwrap_or_else(|| AppContext::anonymous(req.path()));
    ready(Ok(ctx))
  }
}
