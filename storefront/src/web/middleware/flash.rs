// storefront/src/web/middleware/flash.rs

use actix_web::{
  body::EitherBody,
  dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
  Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::error;

use super::is_static_path;
use crate::flash::{FlashMessages, FlashStore};

/// Drains queued flash messages into request extensions.
///
/// Once the handler has run, the flash cookie is cleared unless the handler
/// queued new messages of its own. Errors from inner services become their
/// error response here so the cookie is cleared on failure pages too. A flash
/// cookie that cannot be read is logged and treated as empty.
pub struct DrainFlash {
  flashes: FlashStore,
}

impl DrainFlash {
  pub fn new(flashes: FlashStore) -> Self {
    Self { flashes }
  }
}

impl<S, B> Transform<S, ServiceRequest> for DrainFlash
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type InitError = ();
  type Transform = DrainFlashMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(DrainFlashMiddleware {
      service,
      flashes: self.flashes.clone(),
    }))
  }
}

pub struct DrainFlashMiddleware<S> {
  service: S,
  flashes: FlashStore,
}

impl<S, B> Service<ServiceRequest> for DrainFlashMiddleware<S>
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
    if is_static_path(req.path()) {
      let fut = self.service.call(req);
      return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
    }

    let cookie_name = self.flashes.cookie_name().to_string();
    let had_cookie = req
      .cookie(&cookie_name)
      .map(|c| !c.value().is_empty())
      .unwrap_or(false);

    let messages = self.flashes.drain(req.request()).unwrap_or_else(|e| {
      error!(error = %e, "Could not load flash messages");
      Vec::new()
    });
    req.extensions_mut().insert(FlashMessages(messages));

    let cleared = self.flashes.cleared();
    let http_req = req.request().clone();
    let fut = self.service.call(req);

    Box::pin(async move {
      let mut res = match fut.await {
        Ok(res) => res.map_into_left_body(),
        Err(err) => ServiceResponse::from_err(err, http_req).map_into_right_body(),
      };
      let requeued = res.response().cookies().any(|c| c.name() == cookie_name);
      if had_cookie && !requeued {
        if let Err(e) = res.response_mut().add_cookie(&cleared) {
          error!(error = %e, "Could not clear the flash cookie");
        }
      }
      Ok(res)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flash::FlashMessage;
  use crate::session::keys::cookie_key;
  use actix_web::{http::header, test, web, App, HttpResponse};

  fn store() -> FlashStore {
    FlashStore::new(cookie_key("auth-secret", "enc-secret"), false)
  }

  // Raw header text: parsing it back would clamp a negative Max-Age to zero.
  fn set_cookie_header<B>(resp: &ServiceResponse<B>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    resp
      .headers()
      .get_all(header::SET_COOKIE)
      .filter_map(|v| v.to_str().ok())
      .find(|v| v.starts_with(&prefix))
      .map(str::to_string)
  }

  async fn list_flashes(flashes: FlashMessages) -> HttpResponse {
    HttpResponse::Ok().json(flashes)
  }

  #[actix_web::test]
  async fn queued_messages_reach_the_handler_and_are_cleared() {
    let store = store();
    let app = test::init_service(
      App::new()
        .wrap(DrainFlash::new(store.clone()))
        .route("/", web::get().to(list_flashes)),
    )
    .await;

    let cookie = store.queue(&[FlashMessage::success("Category created")]).unwrap();
    let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;

    let cleared = set_cookie_header(&resp, "flash_session").expect("flash cookie cleared");
    assert!(cleared.starts_with("flash_session=;"), "{}", cleared);
    assert!(cleared.contains("Max-Age=-1"), "{}", cleared);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["message"], "Category created");
    assert_eq!(body[0]["type"], "success");
  }

  #[actix_web::test]
  async fn requests_without_flashes_get_no_cookie() {
    let app = test::init_service(
      App::new()
        .wrap(DrainFlash::new(store()))
        .route("/", web::get().to(list_flashes)),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.response().cookies().count(), 0);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!([]));
  }

  #[actix_web::test]
  async fn handler_queued_flash_is_not_overwritten() {
    let store = store();
    let handler_store = store.clone();
    let app = test::init_service(App::new().wrap(DrainFlash::new(store.clone())).route(
      "/",
      web::post().to(move || {
        let store = handler_store.clone();
        async move {
          let cookie = store.queue(&[FlashMessage::error("Update failed")]).unwrap();
          HttpResponse::SeeOther()
            .insert_header(("Location", "/"))
            .cookie(cookie)
            .finish()
        }
      }),
    ))
    .await;

    let old = store.queue(&[FlashMessage::success("Old news")]).unwrap();
    let req = test::TestRequest::post().uri("/").cookie(old).to_request();
    let resp = test::call_service(&app, req).await;

    let flash_cookies: Vec<_> = resp
      .response()
      .cookies()
      .filter(|c| c.name() == "flash_session")
      .collect();
    assert_eq!(flash_cookies.len(), 1);
    assert!(!flash_cookies[0].value().is_empty());
  }

  #[actix_web::test]
  async fn failing_inner_service_still_clears_the_cookie() {
    let store = store();
    let app = test::init_service(
      App::new()
        .wrap_fn(|_req, _srv| async {
          Err::<ServiceResponse, Error>(actix_web::error::ErrorBadGateway("backend unavailable"))
        })
        .wrap(DrainFlash::new(store.clone()))
        .route("/", web::get().to(list_flashes)),
    )
    .await;

    let cookie = store.queue(&[FlashMessage::success("Product created")]).unwrap();
    let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_GATEWAY);
    let cleared = set_cookie_header(&resp, "flash_session").expect("flash cookie cleared");
    assert!(cleared.contains("Max-Age=-1"), "{}", cleared);
  }

  #[actix_web::test]
  async fn unreadable_flash_cookie_degrades_to_empty() {
    let foreign = FlashStore::new(cookie_key("other", "keys"), false)
      .queue(&[FlashMessage::success("sealed elsewhere")])
      .unwrap();
    let app = test::init_service(
      App::new()
        .wrap(DrainFlash::new(store()))
        .route("/", web::get().to(list_flashes)),
    )
    .await;

    let req = test::TestRequest::get().uri("/").cookie(foreign).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!([]));
  }
}
