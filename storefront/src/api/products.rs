// storefront/src/api/products.rs

use reqwest::multipart::{Form, Part};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

use super::{client, endpoint, send_json, ApiError};
use crate::models::{
  CreateProductRequest, ProductImagesResponse, ProductListResponse, ProductResponse, UpdateProductRequest,
};

/// One image file waiting to be attached to a product.
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub file_name: String,
  pub content_type: Option<String>,
  pub path: PathBuf,
}

#[instrument(name = "api::get_products", skip(base_url), err(Display))]
pub async fn get_products(base_url: &str) -> Result<ProductListResponse, ApiError> {
  const OP: &str = "get products";
  let url = endpoint(base_url, "/products")?;

  let http = client(OP, None)?;
  send_json(OP, http.get(url)).await
}

#[instrument(name = "api::get_product_by_sku", skip(base_url), err(Display))]
pub async fn get_product_by_sku(base_url: &str, sku: &str) -> Result<ProductResponse, ApiError> {
  const OP: &str = "get product";
  let base = endpoint(base_url, "/products/sku")?;

  // The SKU comes straight from the storefront URL, so it is pushed as an encoded segment.
  let mut url = reqwest::Url::parse(&base).map_err(|e| ApiError::InvalidUrl {
    op: OP,
    url: base.clone(),
    reason: e.to_string(),
  })?;
  url
    .path_segments_mut()
    .map_err(|_| ApiError::InvalidUrl {
      op: OP,
      url: base.clone(),
      reason: "URL cannot be a base".to_string(),
    })?
    .push(sku);

  let http = client(OP, None)?;
  send_json(OP, http.get(url)).await
}

#[instrument(
  name = "api::create_product",
  skip(base_url, product, token),
  fields(sku = %product.sku),
  err(Display)
)]
pub async fn create_product(
  base_url: &str,
  product: &CreateProductRequest,
  token: &str,
) -> Result<ProductResponse, ApiError> {
  const OP: &str = "create product";
  let url = endpoint(base_url, "/products")?;

  let http = client(OP, None)?;
  let response: ProductResponse = send_json(OP, http.post(url).bearer_auth(token).json(product)).await?;
  info!(product_id = response.data.id, "Product created.");
  Ok(response)
}

#[instrument(name = "api::update_product", skip(base_url, token, product), err(Display))]
pub async fn update_product(
  base_url: &str,
  token: &str,
  id: i64,
  product: &UpdateProductRequest,
) -> Result<ProductResponse, ApiError> {
  const OP: &str = "update product";
  let url = endpoint(base_url, &format!("/products/{}", id))?;

  let http = client(OP, None)?;
  send_json(OP, http.put(url).bearer_auth(token).json(product)).await
}

/// Uploads `images` one by one, one multipart request per image.
///
/// The batch is not atomic. A failing image is recorded and the loop moves on;
/// images that were already accepted stay on the product. When anything failed the
/// error lists every failure as `image {idx}: {reason}` (0-based), without saying
/// which images went through. On full success the last backend response is
/// returned.
#[instrument(
  name = "api::upload_product_images",
  skip(base_url, images, token),
  fields(image_count = images.len()),
  err(Display)
)]
pub async fn upload_product_images(
  base_url: &str,
  product_id: i64,
  images: &[ImageUpload],
  token: &str,
) -> Result<ProductImagesResponse, ApiError> {
  const OP: &str = "add product images";
  let url = endpoint(base_url, &format!("/products/{}/images", product_id))?;
  let http = client(OP, None)?;

  let mut last_response = ProductImagesResponse::default();
  let mut failures = Vec::new();

  for (idx, image) in images.iter().enumerate() {
    match upload_one(&http, &url, image, token).await {
      Ok(response) => {
        debug!(idx, file_name = %image.file_name, "Image uploaded.");
        last_response = response;
      }
      Err(reason) => {
        warn!(idx, file_name = %image.file_name, %reason, "Image upload failed.");
        failures.push(format!("image {}: {}", idx, reason));
      }
    }
  }

  if failures.is_empty() {
    Ok(last_response)
  } else {
    Err(ApiError::ImageUpload { failures })
  }
}

async fn upload_one(
  http: &reqwest::Client,
  url: &str,
  image: &ImageUpload,
  token: &str,
) -> Result<ProductImagesResponse, String> {
  let data = tokio::fs::read(&image.path)
    .await
    .map_err(|e| format!("open file: {}", e))?;

  let content_type = image.content_type.as_deref().unwrap_or("application/octet-stream");
  let part = Part::bytes(data)
    .file_name(image.file_name.clone())
    .mime_str(content_type)
    .map_err(|e| format!("create form file: {}", e))?;
  let form = Form::new().part("image", part);

  let response = http
    .post(url)
    .bearer_auth(token)
    .multipart(form)
    .send()
    .await
    .map_err(|e| format!("send request: {}", e))?;

  let status = response.status();
  let body = response
    .bytes()
    .await
    .map_err(|e| format!("read response: {}", e))?;

  if !status.is_success() {
    let message = String::from_utf8_lossy(&body).trim().to_string();
    let message = if message.is_empty() {
      "empty response body".to_string()
    } else {
      message
    };
    return Err(format!("status code {}: {}", status.as_u16(), message));
  }

  serde_json::from_slice(&body).map_err(|e| format!("decode response: {}", e))
}
