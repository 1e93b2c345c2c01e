// storefront/src/models/product.rs

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use std::collections::BTreeMap;

use super::category::Category;
use super::envelope::ApiResponse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductRequest {
  pub name: String,
  pub category_id: i64,
  pub price: f64,
  pub stock: i64,
  pub description: String,
  pub sku: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductRequest {
  pub name: String,
  pub category_id: i64,
  pub price: f64,
  pub stock: i64,
  pub description: String,
  // Left out of the payload when unset so an update never blanks the stored SKU.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sku: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
  #[serde_as(as = "DefaultOnNull")]
  pub id: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub url: String,
  #[serde_as(as = "DefaultOnNull")]
  pub alt_text: String,
  #[serde_as(as = "DefaultOnNull")]
  pub is_primary: bool,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
  #[serde_as(as = "DefaultOnNull")]
  pub id: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub name: String,
  #[serde_as(as = "DefaultOnNull")]
  pub category_id: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub price: f64,
  #[serde_as(as = "DefaultOnNull")]
  pub images: Vec<Image>,
  #[serde_as(as = "DefaultOnNull")]
  pub is_active: bool,
  #[serde_as(as = "DefaultOnNull")]
  pub sku: String,
  #[serde_as(as = "DefaultOnNull")]
  pub stock: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub description: String,
  #[serde_as(as = "DefaultOnNull")]
  pub category: Category,
}

/// Pagination metadata attached to product listings.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
  #[serde_as(as = "DefaultOnNull")]
  pub page: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub limit: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub total: i64,
  #[serde_as(as = "DefaultOnNull")]
  pub total_pages: i64,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductListResponse {
  #[serde_as(as = "DefaultOnNull")]
  pub success: bool,
  pub message: Option<String>,
  pub error: Option<String>,
  #[serde_as(as = "DefaultOnNull")]
  pub data: Vec<Product>,
  #[serde_as(as = "DefaultOnNull")]
  pub meta: Meta,
}

pub type ProductResponse = ApiResponse<Product>;
pub type ProductImagesResponse = ApiResponse<BTreeMap<String, String>>;
