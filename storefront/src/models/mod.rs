// storefront/src/models/mod.rs

//! Records exchanged with the backend REST API.

pub mod category;
pub mod envelope;
pub mod product;
pub mod user;

pub use category::{Category, CategoryListResponse, CategoryResponse, CreateCategoryRequest};
pub use envelope::ApiResponse;
pub use product::{
  CreateProductRequest, Image, Meta, Product, ProductImagesResponse, ProductListResponse, ProductResponse,
  UpdateProductRequest,
};
pub use user::{LoginData, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User};
