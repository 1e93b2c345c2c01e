// storefront/src/api/auth.rs

use tracing::{info, instrument};

use super::{client, endpoint, send_json, ApiError, AUTH_CALL_TIMEOUT};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

#[instrument(name = "api::login", skip(base_url, request), fields(email = %request.email), err(Display))]
pub async fn login(base_url: &str, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
  const OP: &str = "login";
  let url = endpoint(base_url, "/auth/login")?;

  let http = client(OP, Some(AUTH_CALL_TIMEOUT))?;
  let response: LoginResponse = send_json(OP, http.post(url).json(request)).await?;

  info!(user_id = response.data.user.id, "Backend accepted login.");
  Ok(response)
}

#[instrument(name = "api::register", skip(base_url, request), fields(email = %request.email), err(Display))]
pub async fn register(base_url: &str, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
  const OP: &str = "register";
  let url = endpoint(base_url, "/auth/register")?;

  let http = client(OP, Some(AUTH_CALL_TIMEOUT))?;
  send_json(OP, http.post(url).json(request)).await
}
