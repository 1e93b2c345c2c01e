// storefront/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::api::ApiError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Backend API Error: {0}")]
  Api(#[from] ApiError),

  #[error("Session Error: {0}")]
  Session(#[from] SessionError),

  #[error("Template Error: {0:?}")]
  Template(#[from] tera::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response; the page itself stays generic.
    let (title, detail) = match self {
      AppError::Validation(m) => {
        tracing::warn!(application_error = %self, "Rejecting request");
        ("Invalid request", m.as_str())
      }
      _ => {
        tracing::error!(application_error = %self, "Responding with error");
        ("Something went wrong", "An internal error occurred. Please try again later.")
      }
    };

    HttpResponse::build(self.status_code())
      .content_type("text/html; charset=utf-8")
      .body(error_page_html(title, detail))
  }
}

// Errors can be raised before templates are available (or by the template engine
// itself), so the fallback page is plain markup.
fn error_page_html(title: &str, detail: &str) -> String {
  format!(
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
     <body><h1>{title}</h1><p>{detail}</p><a href=\"/\">Back to the store</a></body></html>",
    title = tera::escape_html(title),
    detail = tera::escape_html(detail),
  )
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::MessageBody;

  #[test]
  fn validation_errors_are_bad_requests_with_escaped_detail() {
    let err = AppError::Validation("missing <product_name>".to_string());
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let body = err.error_response().into_body().try_into_bytes().unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("missing &lt;product_name&gt;"));
  }

  #[test]
  fn backend_failures_render_a_generic_page() {
    let err = AppError::Api(ApiError::MissingBaseUrl);
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = err.error_response().into_body().try_into_bytes().unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Something went wrong"));
    assert!(!html.contains("base URL"));
  }
}
