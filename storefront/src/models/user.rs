// storefront/src/models/user.rs

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::envelope::ApiResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
  pub email: String,
  pub password: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
  #[serde_as(as = "DefaultOnNull")]
  pub id: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub email: String,
  #[serde_as(as = "DefaultOnNull")]
  pub first_name: String,
  #[serde_as(as = "DefaultOnNull")]
  pub last_name: String,
  #[serde_as(as = "DefaultOnNull")]
  pub phone: String,
  #[serde_as(as = "DefaultOnNull")]
  pub role: String,
  #[serde_as(as = "DefaultOnNull")]
  pub is_active: bool,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginData {
  #[serde_as(as = "DefaultOnNull")]
  pub user: User,
  #[serde_as(as = "DefaultOnNull")]
  pub access_token: String,
  #[serde_as(as = "DefaultOnNull")]
  pub refresh_token: String,
}

pub type LoginResponse = ApiResponse<LoginData>;

// The backend's registration payload is not used by the storefront.
pub type RegisterResponse = ApiResponse<serde_json::Value>;
