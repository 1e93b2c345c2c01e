// storefront/src/api/categories.rs

use tracing::instrument;

use super::{client, endpoint, send_json, ApiError};
use crate::models::{CategoryListResponse, CategoryResponse, CreateCategoryRequest};

#[instrument(name = "api::get_all_categories", skip(base_url), err(Display))]
pub async fn get_all_categories(base_url: &str) -> Result<CategoryListResponse, ApiError> {
  const OP: &str = "get categories";
  let url = endpoint(base_url, "/categories")?;

  let http = client(OP, None)?;
  send_json(OP, http.get(url)).await
}

#[instrument(
  name = "api::create_category",
  skip(base_url, category, token),
  fields(category_name = %category.name),
  err(Display)
)]
pub async fn create_category(
  base_url: &str,
  category: &CreateCategoryRequest,
  token: &str,
) -> Result<CategoryResponse, ApiError> {
  const OP: &str = "create category";
  let url = endpoint(base_url, "/categories")?;

  let http = client(OP, None)?;
  send_json(OP, http.post(url).bearer_auth(token).json(category)).await
}
