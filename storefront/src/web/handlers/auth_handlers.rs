// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::api;
use crate::errors::AppError;
use crate::flash::{FlashMessage, FlashMessages};
use crate::models::{LoginRequest, RegisterRequest};
use crate::session::{AppContext, SessionIdentity};
use crate::state::AppState;
use crate::web::middleware::CsrfToken;
use crate::web::views::{see_other, Page};

// --- Form DTOs ---

#[derive(Deserialize)]
pub struct LoginUserForm {
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub remember: Option<String>,
}

impl LoginUserForm {
  /// Checkbox semantics: present with any truthy value.
  pub fn remember_me(&self) -> bool {
    matches!(
      self.remember.as_deref().map(str::trim),
      Some("on") | Some("true") | Some("1") | Some("yes")
    )
  }
}

#[derive(Deserialize)]
pub struct RegisterUserForm {
  pub email: String,
  pub password: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub phone: String,
}

impl From<RegisterUserForm> for RegisterRequest {
  fn from(form: RegisterUserForm) -> Self {
    RegisterRequest {
      email: form.email,
      password: form.password,
      first_name: form.first_name,
      last_name: form.last_name,
      phone: form.phone,
    }
  }
}

// --- Handler Implementations ---

#[instrument(name = "handler::login_page", skip_all)]
pub async fn login_page_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
  csrf: CsrfToken,
) -> Result<HttpResponse, AppError> {
  Page::new("Storefront - Log in", &ctx, &flashes)
    .with_csrf(&csrf)
    .render(&app_state.templates, "login.html")
}

#[instrument(
    name = "handler::login",
    skip(app_state, form),
    fields(req_email = %form.email)
)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  form: web::Form<LoginUserForm>,
) -> Result<HttpResponse, AppError> {
  let form = form.into_inner();
  let remember = form.remember_me();

  let response = api::login(
    app_state.api_url(),
    &LoginRequest {
      email: form.email,
      password: form.password,
    },
  )
  .await?;

  let user = response.data.user;
  let identity = SessionIdentity {
    user_id: user.id,
    email: user.email,
    token: response.data.access_token,
    authenticated: true,
    role: user.role,
  };
  let cookie = app_state.sessions.issue(&identity, remember)?;

  info!(user_id = identity.user_id, remember, "User logged in.");
  Ok(see_other("/").cookie(cookie).finish())
}

#[instrument(name = "handler::register_page", skip_all)]
pub async fn register_page_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
  csrf: CsrfToken,
) -> Result<HttpResponse, AppError> {
  Page::new("Storefront - Register", &ctx, &flashes)
    .with_csrf(&csrf)
    .render(&app_state.templates, "register.html")
}

#[instrument(
    name = "handler::register",
    skip(app_state, form),
    fields(req_email = %form.email)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  form: web::Form<RegisterUserForm>,
) -> Result<HttpResponse, AppError> {
  let request = RegisterRequest::from(form.into_inner());
  api::register(app_state.api_url(), &request).await?;

  info!("Account registered.");
  let flash = app_state
    .flashes
    .queue(&[FlashMessage::success("Your account was created. You can now log in.")])?;
  Ok(see_other("/").cookie(flash).finish())
}

#[instrument(name = "handler::logout", skip_all, fields(user_id = ctx.user_id))]
pub async fn logout_handler(app_state: web::Data<AppState>, ctx: AppContext) -> HttpResponse {
  info!("User logged out.");
  see_other("/").cookie(app_state.sessions.invalidate()).finish()
}
