// storefront/src/web/handlers/admin_handlers.rs

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::api::{self, ImageUpload};
use crate::errors::AppError;
use crate::flash::{FlashMessage, FlashMessages};
use crate::models::{CreateCategoryRequest, CreateProductRequest, UpdateProductRequest};
use crate::session::AppContext;
use crate::state::AppState;
use crate::web::middleware::CsrfToken;
use crate::web::views::{see_other, Page};

const PRODUCT_DASHBOARD: &str = "/admin/dashboard/product/register";
const CATEGORY_DASHBOARD: &str = "/admin/dashboard/category/register";

// --- Form DTOs ---

#[derive(Deserialize, Debug)]
pub struct CreateCategoryForm {
  #[serde(rename = "category_name")]
  pub name: String,
  #[serde(rename = "category_description", default)]
  pub description: String,
}

/// Product fields shared by the create and update forms.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CreateProductForm {
  #[serde(rename = "product_id", default)]
  pub id: Option<i64>,
  #[serde(rename = "product_name")]
  pub name: String,
  #[serde(rename = "product_category")]
  pub category_id: i64,
  #[serde(rename = "product_price")]
  pub price: f64,
  #[serde(rename = "product_stock")]
  pub stock: i64,
  #[serde(rename = "product_description", default)]
  pub description: String,
}

impl CreateProductForm {
  /// SKU derived from the product name.
  pub fn sku(&self) -> String {
    slug::slugify(&self.name)
  }

  pub fn into_create_request(self) -> CreateProductRequest {
    let sku = self.sku();
    CreateProductRequest {
      name: self.name,
      category_id: self.category_id,
      price: self.price,
      stock: self.stock,
      description: self.description,
      sku,
    }
  }

  pub fn into_update_request(self) -> UpdateProductRequest {
    UpdateProductRequest {
      name: self.name,
      category_id: self.category_id,
      price: self.price,
      stock: self.stock,
      description: self.description,
      sku: None,
    }
  }
}

/// Multipart body of the product creation form.
#[derive(MultipartForm)]
pub struct CreateProductUpload {
  pub product_name: Text<String>,
  pub product_category: Text<i64>,
  pub product_price: Text<f64>,
  pub product_stock: Text<i64>,
  pub product_description: Option<Text<String>>,
  pub images: Vec<TempFile>,
}

impl CreateProductUpload {
  /// Splits the body into product fields and the image files that carry data.
  /// Browsers submit an empty file part when nothing was selected.
  pub fn into_parts(self) -> (CreateProductForm, Vec<TempFile>) {
    let form = CreateProductForm {
      id: None,
      name: self.product_name.into_inner(),
      category_id: self.product_category.into_inner(),
      price: self.product_price.into_inner(),
      stock: self.product_stock.into_inner(),
      description: self
        .product_description
        .map(Text::into_inner)
        .unwrap_or_default(),
    };
    let images = self.images.into_iter().filter(|file| file.size > 0).collect();
    (form, images)
  }
}

fn image_upload(idx: usize, file: &TempFile) -> ImageUpload {
  ImageUpload {
    file_name: file
      .file_name
      .clone()
      .filter(|name| !name.is_empty())
      .unwrap_or_else(|| format!("image-{}", idx)),
    content_type: file.content_type.as_ref().map(|mime| mime.to_string()),
    path: file.file.path().to_path_buf(),
  }
}

// --- Handler Implementations ---

#[instrument(name = "handler::product_dashboard", skip_all, fields(user_id = ctx.user_id))]
pub async fn product_page_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
  csrf: CsrfToken,
) -> Result<HttpResponse, AppError> {
  let products = api::get_products(app_state.api_url()).await?;
  let categories = api::get_all_categories(app_state.api_url()).await?;

  Page::new("Storefront - Register product", &ctx, &flashes)
    .with_csrf(&csrf)
    .insert("products", &products.data)
    .insert("categories", &categories.data)
    .render(&app_state.templates, "admin/product_register.html")
}

#[instrument(name = "handler::category_dashboard", skip_all, fields(user_id = ctx.user_id))]
pub async fn category_page_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  flashes: FlashMessages,
  csrf: CsrfToken,
) -> Result<HttpResponse, AppError> {
  let categories = api::get_all_categories(app_state.api_url()).await?;

  Page::new("Storefront - Register category", &ctx, &flashes)
    .with_csrf(&csrf)
    .insert("categories", &categories.data)
    .render(&app_state.templates, "admin/category_register.html")
}

#[instrument(
    name = "handler::create_category",
    skip(app_state, ctx, form),
    fields(user_id = ctx.user_id, category_name = %form.name)
)]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  form: web::Form<CreateCategoryForm>,
) -> Result<HttpResponse, AppError> {
  let form = form.into_inner();
  let request = CreateCategoryRequest {
    name: form.name,
    description: form.description,
  };
  let created = api::create_category(app_state.api_url(), &request, &ctx.token).await?;
  info!(category_id = created.data.id, "Category created.");

  let flash = app_state
    .flashes
    .queue(&[FlashMessage::success(format!("Category '{}' created.", request.name))])?;
  Ok(see_other(CATEGORY_DASHBOARD).cookie(flash).finish())
}

/// Creates the product, then attaches its images in a separate call. A failed
/// upload leaves the product in place.
#[instrument(name = "handler::create_product", skip_all, fields(user_id = ctx.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  MultipartForm(upload): MultipartForm<CreateProductUpload>,
) -> Result<HttpResponse, AppError> {
  let (form, images) = upload.into_parts();
  let request = form.into_create_request();

  let created = api::create_product(app_state.api_url(), &request, &ctx.token).await?;
  let product_id = created.data.id;
  info!(product_id, sku = %request.sku, image_count = images.len(), "Product created.");

  if !images.is_empty() {
    // `images` keeps the temp files alive until the upload finishes.
    let uploads: Vec<ImageUpload> = images
      .iter()
      .enumerate()
      .map(|(idx, file)| image_upload(idx, file))
      .collect();
    api::upload_product_images(app_state.api_url(), product_id, &uploads, &ctx.token).await?;
  }

  let flash = app_state
    .flashes
    .queue(&[FlashMessage::success(format!("Product '{}' created.", request.name))])?;
  Ok(see_other(PRODUCT_DASHBOARD).cookie(flash).finish())
}

/// Update failures do not surface as an error page: the admin is sent back to
/// the dashboard with an error flash.
#[instrument(
    name = "handler::update_product",
    skip(app_state, ctx, form),
    fields(user_id = ctx.user_id, product_id = ?form.id)
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  ctx: AppContext,
  form: web::Form<CreateProductForm>,
) -> Result<HttpResponse, AppError> {
  let form = form.into_inner();
  let id = form
    .id
    .ok_or_else(|| AppError::Validation("product_id is required".to_string()))?;
  let name = form.name.clone();

  let flash = match api::update_product(app_state.api_url(), &ctx.token, id, &form.into_update_request()).await {
    Ok(_) => {
      info!("Product updated.");
      FlashMessage::success(format!("Product '{}' updated.", name))
    }
    Err(e) => {
      error!(error = %e, "Product update failed");
      FlashMessage::error(format!("Product '{}' could not be updated.", name))
    }
  };

  let cookie = app_state.flashes.queue(&[flash])?;
  Ok(see_other(PRODUCT_DASHBOARD).cookie(cookie).finish())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form() -> CreateProductForm {
    CreateProductForm {
      id: None,
      name: "Handmade Leather Tote".to_string(),
      category_id: 3,
      price: 49.9,
      stock: 12,
      description: "Full grain".to_string(),
    }
  }

  #[test]
  fn create_request_preserves_fields_and_slugs_the_name() {
    let request = form().into_create_request();
    assert_eq!(request.name, "Handmade Leather Tote");
    assert_eq!(request.description, "Full grain");
    assert_eq!(request.price, 49.9);
    assert_eq!(request.stock, 12);
    assert_eq!(request.category_id, 3);
    assert_eq!(request.sku, "handmade-leather-tote");
  }

  #[test]
  fn sku_is_deterministic() {
    assert_eq!(form().sku(), form().sku());
    let mut accented = form();
    accented.name = "Café  Olé!".to_string();
    assert_eq!(accented.sku(), "cafe-ole");
  }

  #[test]
  fn update_request_omits_the_sku() {
    let json = serde_json::to_value(form().into_update_request()).unwrap();
    assert!(json.get("sku").is_none());
    assert_eq!(json["category_id"], 3);
  }

  #[test]
  fn update_form_binds_from_urlencoded_fields() {
    let parsed: CreateProductForm = serde_urlencoded::from_str(
      "csrf_token=t&product_id=8&product_name=Tote&product_category=2&product_price=10.5&product_stock=4&product_description=Bag",
    )
    .unwrap();
    assert_eq!(parsed.id, Some(8));
    assert_eq!(parsed.name, "Tote");
    assert_eq!(parsed.category_id, 2);
    assert_eq!(parsed.price, 10.5);
    assert_eq!(parsed.stock, 4);
    assert_eq!(parsed.description, "Bag");
  }

  #[test]
  fn category_form_binds_renamed_fields() {
    let parsed: CreateCategoryForm =
      serde_urlencoded::from_str("category_name=Bags&category_description=All+bags").unwrap();
    assert_eq!(parsed.name, "Bags");
    assert_eq!(parsed.description, "All bags");
  }
}
