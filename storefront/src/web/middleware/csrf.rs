// storefront/src/web/middleware/csrf.rs

//! Double-submit CSRF protection.
//!
//! The real token lives in a signed `_csrf` cookie. Pages receive a masked
//! copy (random pad || pad XOR token), so the value embedded in HTML changes on
//! every render while still validating against the same cookie.

use actix_multipart::Multipart;
use actix_web::{
  body::EitherBody,
  cookie::{time::Duration, Cookie, CookieJar, Key, SameSite},
  dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
  error::{ErrorPayloadTooLarge, PayloadError},
  http::{header, Method, Uri},
  Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::{Bytes, BytesMut};
use futures_util::{future::LocalBoxFuture, stream, StreamExt};
use rand_core::{OsRng, RngCore};
use std::{
  fmt,
  future::{ready, Ready},
  rc::Rc,
};
use tracing::{debug, error};

use crate::errors::AppError;

pub const CSRF_COOKIE_NAME: &str = "_csrf";
pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const CSRF_FORM_FIELD: &str = "csrf_token";

const TOKEN_LEN: usize = 32;
const CSRF_COOKIE_MAX_AGE_SECS: i64 = 12 * 60 * 60;

#[derive(Clone)]
pub struct CsrfSettings {
  key: Key,
  secure: bool,
  trusted_origins: Vec<String>,
  max_body_bytes: usize,
}

impl CsrfSettings {
  /// `trusted_origins` entries may be bare hosts (`shop.example.com:8443`) or
  /// full origins (`https://shop.example.com`).
  pub fn new(key: Key, secure: bool, trusted_origins: Vec<String>, max_body_bytes: usize) -> Self {
    Self {
      key,
      secure,
      trusted_origins,
      max_body_bytes,
    }
  }

  fn read_cookie_token(&self, req: &HttpRequest) -> Option<Vec<u8>> {
    let raw = req.cookie(CSRF_COOKIE_NAME)?;
    let mut jar = CookieJar::new();
    jar.add_original(raw);
    let verified = jar.signed(&self.key).get(CSRF_COOKIE_NAME)?;
    STANDARD
      .decode(verified.value())
      .ok()
      .filter(|token| token.len() == TOKEN_LEN)
  }

  fn token_cookie(&self, token: &[u8]) -> Option<Cookie<'static>> {
    let mut builder = Cookie::build(CSRF_COOKIE_NAME, STANDARD.encode(token))
      .path("/")
      .http_only(true)
      .secure(self.secure)
      .max_age(Duration::seconds(CSRF_COOKIE_MAX_AGE_SECS));
    if self.secure {
      builder = builder.same_site(SameSite::None);
    }

    let mut jar = CookieJar::new();
    jar.signed_mut(&self.key).add(builder.finish());
    jar.get(CSRF_COOKIE_NAME).cloned()
  }

  fn is_trusted(&self, origin: &str) -> bool {
    let Some((scheme, authority)) = split_origin(origin) else {
      return false;
    };
    let full = format!("{}://{}", scheme, authority);
    self.trusted_origins.iter().any(|trusted| {
      let trusted = trusted.trim_end_matches('/');
      trusted.eq_ignore_ascii_case(&authority) || trusted.eq_ignore_ascii_case(&full)
    })
  }

  /// Origin and Referer checks for state-changing requests. The Referer is
  /// only required in secure mode over HTTPS.
  fn check_origin(&self, req: &ServiceRequest) -> Result<(), CsrfFailure> {
    let (scheme, host) = {
      let conn = req.connection_info();
      (conn.scheme().to_string(), conn.host().to_string())
    };

    if let Some(origin) = header_str(req, header::ORIGIN) {
      let same = split_origin(origin)
        .map(|(s, a)| s.eq_ignore_ascii_case(&scheme) && a.eq_ignore_ascii_case(&host))
        .unwrap_or(false);
      if same || self.is_trusted(origin) {
        return Ok(());
      }
      return Err(CsrfFailure::BadOrigin(origin.to_string()));
    }

    if self.secure && scheme.eq_ignore_ascii_case("https") {
      let referer = header_str(req, header::REFERER).ok_or(CsrfFailure::NoReferer)?;
      let same = split_origin(referer)
        .map(|(s, a)| s.eq_ignore_ascii_case("https") && a.eq_ignore_ascii_case(&host))
        .unwrap_or(false);
      if !same && !self.is_trusted(referer) {
        return Err(CsrfFailure::BadReferer(referer.to_string()));
      }
    }

    Ok(())
  }
}

#[derive(Debug)]
enum CsrfFailure {
  BadOrigin(String),
  NoReferer,
  BadReferer(String),
  NoCookie,
  NoToken,
  BadToken,
}

impl fmt::Display for CsrfFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CsrfFailure::BadOrigin(origin) => write!(f, "origin '{}' is not trusted", origin),
      CsrfFailure::NoReferer => write!(f, "referer header missing"),
      CsrfFailure::BadReferer(referer) => write!(f, "referer '{}' is not trusted", referer),
      CsrfFailure::NoCookie => write!(f, "CSRF cookie missing or invalid"),
      CsrfFailure::NoToken => write!(f, "CSRF token not found in request"),
      CsrfFailure::BadToken => write!(f, "CSRF token invalid"),
    }
  }
}

/// Masked token for the current request, to be embedded in forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl FromRequest for CsrfToken {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(
      req
        .extensions()
        .get::<CsrfToken>()
        .cloned()
        .ok_or_else(|| AppError::Internal("CSRF middleware is not installed".to_string())),
    )
  }
}

pub fn generate_token() -> [u8; TOKEN_LEN] {
  let mut token = [0u8; TOKEN_LEN];
  OsRng.fill_bytes(&mut token);
  token
}

pub fn mask_token(token: &[u8]) -> String {
  let mut pad = [0u8; TOKEN_LEN];
  OsRng.fill_bytes(&mut pad);
  let mut masked = Vec::with_capacity(TOKEN_LEN * 2);
  masked.extend_from_slice(&pad);
  masked.extend(pad.iter().zip(token).map(|(p, t)| p ^ t));
  STANDARD.encode(masked)
}

pub fn unmask_token(masked: &str) -> Option<Vec<u8>> {
  let raw = STANDARD.decode(masked.trim()).ok()?;
  if raw.len() != TOKEN_LEN * 2 {
    return None;
  }
  let (pad, xored) = raw.split_at(TOKEN_LEN);
  Some(pad.iter().zip(xored).map(|(p, x)| p ^ x).collect())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn is_safe_method(method: &Method) -> bool {
  matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn header_str(req: &ServiceRequest, name: impl header::AsHeaderName) -> Option<&str> {
  req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Splits an origin or URL into lowercase `(scheme, authority)`.
fn split_origin(value: &str) -> Option<(String, String)> {
  let uri: Uri = value.parse().ok()?;
  let scheme = uri.scheme_str()?.to_ascii_lowercase();
  let authority = uri.authority()?.as_str().to_ascii_lowercase();
  Some((scheme, authority))
}

/// Reads the whole request body and puts it back so handlers can read it again.
async fn buffer_payload(req: &mut ServiceRequest, limit: usize) -> Result<Bytes, Error> {
  let mut payload = req.take_payload();
  let mut body = BytesMut::new();
  while let Some(chunk) = payload.next().await {
    let chunk = chunk?;
    if body.len() + chunk.len() > limit {
      return Err(ErrorPayloadTooLarge("request body exceeds the form limit"));
    }
    body.extend_from_slice(&chunk);
  }
  let body = body.freeze();
  req.set_payload(Payload::from(body.clone()));
  Ok(body)
}

/// Looks up the token field in urlencoded or multipart bodies.
async fn read_form_token(req: &mut ServiceRequest, limit: usize) -> Result<Option<String>, Error> {
  let content_type = header_str(req, header::CONTENT_TYPE)
    .unwrap_or_default()
    .to_ascii_lowercase();
  let urlencoded = content_type.starts_with("application/x-www-form-urlencoded");
  let multipart = content_type.starts_with("multipart/form-data");
  if !urlencoded && !multipart {
    return Ok(None);
  }

  let body = buffer_payload(req, limit).await?;

  if urlencoded {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body).unwrap_or_default();
    return Ok(pairs.into_iter().find(|(k, _)| k == CSRF_FORM_FIELD).map(|(_, v)| v));
  }

  let chunks = stream::once(ready(Ok::<Bytes, PayloadError>(body)));
  let mut form = Multipart::new(req.headers(), chunks);
  while let Some(field) = form.next().await {
    let Ok(mut field) = field else {
      return Ok(None);
    };
    let is_token = field.content_disposition().get_name() == Some(CSRF_FORM_FIELD);
    let mut value = Vec::new();
    while let Some(chunk) = field.next().await {
      match chunk {
        Ok(chunk) if is_token => value.extend_from_slice(&chunk),
        Ok(_) => {}
        Err(_) => return Ok(None),
      }
    }
    if is_token {
      return Ok(Some(String::from_utf8_lossy(&value).into_owned()));
    }
  }
  Ok(None)
}

/// Rejects state-changing requests that lack a valid token, and issues the
/// token cookie to clients that do not have one yet.
pub struct CsrfProtect {
  settings: Rc<CsrfSettings>,
}

impl CsrfProtect {
  pub fn new(settings: CsrfSettings) -> Self {
    Self {
      settings: Rc::new(settings),
    }
  }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfProtect
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type InitError = ();
  type Transform = CsrfMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(CsrfMiddleware {
      service: Rc::new(service),
      settings: self.settings.clone(),
    }))
  }
}

pub struct CsrfMiddleware<S> {
  service: Rc<S>,
  settings: Rc<CsrfSettings>,
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, mut req: ServiceRequest) -> Self::Future {
    let service = self.service.clone();
    let settings = self.settings.clone();

    Box::pin(async move {
      let existing = settings.read_cookie_token(req.request());
      let cookie_present = existing.is_some();
      let real_token = existing.unwrap_or_else(|| generate_token().to_vec());
      let new_cookie = if cookie_present {
        None
      } else {
        settings.token_cookie(&real_token)
      };

      if !is_safe_method(req.method()) {
        let header_token = header_str(&req, CSRF_HEADER).map(str::to_string);
        let form_token = match header_token {
          Some(_) => None,
          None => read_form_token(&mut req, settings.max_body_bytes).await?,
        };

        let verdict = settings.check_origin(&req).and_then(|()| {
          if !cookie_present {
            return Err(CsrfFailure::NoCookie);
          }
          let submitted = header_token
            .as_deref()
            .or(form_token.as_deref())
            .ok_or(CsrfFailure::NoToken)?;
          match unmask_token(submitted) {
            Some(candidate) if constant_time_eq(&candidate, &real_token) => Ok(()),
            _ => Err(CsrfFailure::BadToken),
          }
        });

        if let Err(failure) = verdict {
          debug!(
            method = %req.method(),
            path = %req.path(),
            cookie_present,
            header_token = header_token.as_deref().unwrap_or(""),
            form_token = form_token.as_deref().unwrap_or(""),
            reason = %failure,
            "CSRF validation failed"
          );
          let mut response = HttpResponse::Forbidden();
          response.content_type("text/plain; charset=utf-8");
          if let Some(cookie) = new_cookie {
            response.cookie(cookie);
          }
          return Ok(req.into_response(response.body("csrf failed")).map_into_right_body());
        }
      }

      req.extensions_mut().insert(CsrfToken(mask_token(&real_token)));
      let mut res = service.call(req).await?.map_into_left_body();
      if let Some(cookie) = new_cookie {
        if let Err(e) = res.response_mut().add_cookie(&cookie) {
          error!(error = %e, "Could not attach the CSRF cookie");
        }
      }
      Ok(res)
    })
  }
}
