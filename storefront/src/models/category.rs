// storefront/src/models/category.rs

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::envelope::ApiResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
  pub name: String,
  pub description: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
  #[serde_as(as = "DefaultOnNull")]
  pub id: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub name: String,
  #[serde_as(as = "DefaultOnNull")]
  pub description: String,
  #[serde_as(as = "DefaultOnNull")]
  pub is_active: bool,
}

pub type CategoryResponse = ApiResponse<Category>;
pub type CategoryListResponse = ApiResponse<Vec<Category>>;
