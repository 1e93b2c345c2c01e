// storefront/src/web/middleware/guards.rs

use actix_web::{
  body::EitherBody,
  dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
  http::header,
  web, Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::{debug, warn};

use crate::session::{SessionIdentity, SessionStore, ADMIN_ROLE};

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  /// No guard at all.
  Public,
  /// Signed-in users only; others go to `/login`.
  Authenticated,
  /// Signed-out users only; signed-in users go to `/`.
  Anonymous,
  /// Sessions carrying the admin role; others go to `/login`.
  Admin,
}

/// Session as seen by a guard.
#[derive(Debug)]
pub enum SessionState {
  Loaded(Option<SessionIdentity>),
  Unavailable,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GuardOutcome {
  Proceed,
  Redirect(&'static str),
}

impl Access {
  /// Decides whether a request may pass given the session it carries.
  ///
  /// An unreadable session sends authenticated and admin routes to `/login`
  /// but lets anonymous-only routes through. The admin check looks at the role
  /// alone.
  pub fn evaluate(self, session: &SessionState) -> GuardOutcome {
    let identity = match session {
      SessionState::Loaded(identity) => identity.as_ref(),
      SessionState::Unavailable => {
        return match self {
          Access::Public | Access::Anonymous => GuardOutcome::Proceed,
          Access::Authenticated | Access::Admin => GuardOutcome::Redirect("/login"),
        };
      }
    };

    match self {
      Access::Public => GuardOutcome::Proceed,
      Access::Authenticated => match identity {
        Some(id) if id.authenticated => GuardOutcome::Proceed,
        _ => GuardOutcome::Redirect("/login"),
      },
      Access::Anonymous => match identity {
        Some(id) if id.authenticated => GuardOutcome::Redirect("/"),
        _ => GuardOutcome::Proceed,
      },
      Access::Admin => match identity {
        Some(id) if id.role == ADMIN_ROLE => GuardOutcome::Proceed,
        _ => GuardOutcome::Redirect("/login"),
      },
    }
  }
}

/// Per-route access check. Loads the session cookie itself through the
/// [`SessionStore`] registered as app data.
pub struct AccessGuard {
  access: Access,
}

impl AccessGuard {
  pub fn new(access: Access) -> Self {
    Self { access }
  }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type InitError = ();
  type Transform = AccessGuardMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(AccessGuardMiddleware {
      service,
      access: self.access,
    }))
  }
}

pub struct AccessGuardMiddleware<S> {
  service: S,
  access: Access,
}

impl<S, B> Service<ServiceRequest> for AccessGuardMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let session = match req.app_data::<web::Data<SessionStore>>() {
      Some(store) => match store.load(req.request()) {
        Ok(identity) => SessionState::Loaded(identity),
        Err(e) => {
          warn!(error = %e, path = %req.path(), "Guard could not load session");
          SessionState::Unavailable
        }
      },
      None => {
        warn!(path = %req.path(), "No session store registered; treating session as unavailable");
        SessionState::Unavailable
      }
    };

    match self.access.evaluate(&session) {
      GuardOutcome::Proceed => {
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
      }
      GuardOutcome::Redirect(target) => {
        debug!(path = %req.path(), access = ?self.access, location = target, "Access denied; redirecting");
        let response = HttpResponse::TemporaryRedirect()
          .insert_header((header::LOCATION, target))
          .finish();
        let res = req.into_response(response).map_into_right_body();
        Box::pin(async move { Ok(res) })
      }
    }
  }
}
