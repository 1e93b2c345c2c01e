// storefront/src/web/middleware/session.rs

use actix_web::{
  dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
  Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::error;

use super::is_static_path;
use crate::errors::AppError;
use crate::session::{AppContext, SessionStore};

/// Derives the request's [`AppContext`] from the session cookie.
///
/// A cookie that cannot be decrypted or decoded fails the request.
pub struct LoadSession {
  sessions: SessionStore,
}

impl LoadSession {
  pub fn new(sessions: SessionStore) -> Self {
    Self { sessions }
  }
}

impl<S, B> Transform<S, ServiceRequest> for LoadSession
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<B>;
  type Error = Error;
  type InitError = ();
  type Transform = LoadSessionMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(LoadSessionMiddleware {
      service,
      sessions: self.sessions.clone(),
    }))
  }
}

pub struct LoadSessionMiddleware<S> {
  service: S,
  sessions: SessionStore,
}

impl<S, B> Service<ServiceRequest> for LoadSessionMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<B>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    if is_static_path(req.path()) {
      return Box::pin(self.service.call(req));
    }

    let ctx = match self.sessions.load(req.request()) {
      Ok(Some(identity)) => AppContext::from_identity(identity, req.path()),
      Ok(None) => AppContext::anonymous(req.path()),
      Err(e) => {
        error!(error = %e, path = %req.path(), "Could not load session cookie");
        let err: Error = AppError::from(e).into();
        return Box::pin(async move { Err(err) });
      }
    };

    req.extensions_mut().insert(ctx);
    Box::pin(self.service.call(req))
  }
}
