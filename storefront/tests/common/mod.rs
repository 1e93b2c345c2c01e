// storefront/tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use actix_multipart::Multipart;
use actix_web::{
  body::MessageBody,
  cookie::Cookie,
  dev::{ServerHandle, ServiceResponse},
  http::header,
  test::{self, TestRequest},
  web, App, HttpRequest, HttpResponse, HttpServer,
};
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use storefront::{session::SessionIdentity, AppConfig, AppState};
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Mock backend API ---

#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub method: String,
  pub path: String,
  pub authorization: Option<String>,
  pub json: Option<Value>,
  pub file_names: Vec<String>,
}

#[derive(Default)]
pub struct MockState {
  recorded: Mutex<Vec<RecordedRequest>>,
}

pub struct MockBackend {
  pub base_url: String,
  state: web::Data<MockState>,
  handle: ServerHandle,
}

impl MockBackend {
  pub fn recorded(&self) -> Vec<RecordedRequest> {
    self.state.recorded.lock().clone()
  }

  pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
    self
      .recorded()
      .into_iter()
      .filter(|r| r.method == method && r.path == path)
      .collect()
  }

  pub async fn stop(self) {
    self.handle.stop(false).await;
  }
}

fn record(state: &MockState, req: &HttpRequest, json: Option<Value>, file_names: Vec<String>) {
  state.recorded.lock().push(RecordedRequest {
    method: req.method().to_string(),
    path: req.uri().path().to_string(),
    authorization: req
      .headers()
      .get("authorization")
      .and_then(|v| v.to_str().ok())
      .map(str::to_string),
    json,
    file_names,
  });
}

pub fn sample_product(id: i64, name: &str, sku: &str) -> Value {
  json!({
    "id": id,
    "name": name,
    "category_id": 1,
    "price": 49.5,
    "images": [{"id": 1, "url": "https://cdn.example.com/tote.jpg", "alt_text": "Tote", "is_primary": true}],
    "is_active": true,
    "sku": sku,
    "stock": 3,
    "description": "Full grain leather",
    "category": {"id": 1, "name": "Bags", "description": "All bags", "is_active": true}
  })
}

async fn mock_login(state: web::Data<MockState>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
  let body = body.into_inner();
  record(&state, &req, Some(body.clone()), Vec::new());

  if body["password"] == "wrong" {
    return HttpResponse::Unauthorized().body("  invalid credentials \n");
  }
  let role = if body["email"] == "admin@example.com" {
    "admin"
  } else {
    "customer"
  };
  HttpResponse::Ok().json(json!({
    "success": true,
    "message": "logged in",
    "data": {
      "user": {
        "id": 42,
        "email": body["email"].clone(),
        "first_name": "Ana",
        "last_name": "Lopez",
        "phone": "555-0101",
        "role": role,
        "is_active": true
      },
      "access_token": "access-42",
      "refresh_token": "refresh-42"
    }
  }))
}

async fn mock_register(state: web::Data<MockState>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
  record(&state, &req, Some(body.into_inner()), Vec::new());
  HttpResponse::Created().json(json!({"success": true, "message": "registered", "data": {"id": 43}}))
}

async fn mock_products(state: web::Data<MockState>, req: HttpRequest) -> HttpResponse {
  record(&state, &req, None, Vec::new());
  HttpResponse::Ok().json(json!({
    "success": true,
    "data": [sample_product(7, "Leather Tote", "leather-tote")],
    "meta": {"page": 1, "limit": 10, "total": 1, "total_pages": 1}
  }))
}

async fn mock_product_by_sku(state: web::Data<MockState>, req: HttpRequest, sku: web::Path<String>) -> HttpResponse {
  record(&state, &req, None, Vec::new());
  if sku.as_str() == "leather-tote" {
    HttpResponse::Ok().json(json!({"success": true, "data": sample_product(7, "Leather Tote", "leather-tote")}))
  } else {
    HttpResponse::NotFound().body("product not found")
  }
}

async fn mock_create_product(state: web::Data<MockState>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
  let body = body.into_inner();
  record(&state, &req, Some(body.clone()), Vec::new());
  let name = body["name"].as_str().unwrap_or_default().to_string();
  let sku = body["sku"].as_str().unwrap_or_default().to_string();
  HttpResponse::Created().json(json!({"success": true, "data": sample_product(77, &name, &sku)}))
}

async fn mock_update_product(
  state: web::Data<MockState>,
  req: HttpRequest,
  id: web::Path<i64>,
  body: web::Json<Value>,
) -> HttpResponse {
  let body = body.into_inner();
  record(&state, &req, Some(body.clone()), Vec::new());
  if *id == 404 {
    return HttpResponse::NotFound().body("no such product");
  }
  let name = body["name"].as_str().unwrap_or_default().to_string();
  HttpResponse::Ok().json(json!({"success": true, "data": sample_product(*id, &name, "leather-tote")}))
}

// Fails any image whose file name contains "bad" (500 with a body) or "empty"
// (502 without one).
async fn mock_upload_image(
  state: web::Data<MockState>,
  req: HttpRequest,
  id: web::Path<i64>,
  mut payload: Multipart,
) -> HttpResponse {
  let mut file_names = Vec::new();
  while let Some(Ok(mut field)) = payload.next().await {
    if let Some(name) = field.content_disposition().get_filename() {
      file_names.push(name.to_string());
    }
    while let Some(chunk) = field.next().await {
      if chunk.is_err() {
        break;
      }
    }
  }
  record(&state, &req, None, file_names.clone());

  if file_names.iter().any(|n| n.contains("bad")) {
    return HttpResponse::InternalServerError().body("disk full");
  }
  if file_names.iter().any(|n| n.contains("empty")) {
    return HttpResponse::BadGateway().finish();
  }
  HttpResponse::Ok().json(json!({
    "success": true,
    "data": {"url": format!("https://cdn.example.com/{}/{}", id, file_names.join(","))}
  }))
}

async fn mock_categories(state: web::Data<MockState>, req: HttpRequest) -> HttpResponse {
  record(&state, &req, None, Vec::new());
  HttpResponse::Ok().json(json!({
    "success": true,
    "data": [
      {"id": 1, "name": "Bags", "description": "All bags", "is_active": true},
      {"id": 2, "name": "Belts", "description": "Leather belts", "is_active": true}
    ]
  }))
}

async fn mock_create_category(state: web::Data<MockState>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
  let body = body.into_inner();
  record(&state, &req, Some(body.clone()), Vec::new());
  HttpResponse::Created().json(json!({
    "success": true,
    "data": {"id": 5, "name": body["name"].clone(), "description": body["description"].clone(), "is_active": true}
  }))
}

/// Starts the backend stand-in on an ephemeral port. Its base URL ends with a
/// slash, like the default `API_URL`.
pub async fn start_mock_backend() -> MockBackend {
  let state = web::Data::new(MockState::default());
  let app_state = state.clone();

  let server = HttpServer::new(move || {
    App::new().app_data(app_state.clone()).service(
      web::scope("/api/v1")
        .route("/auth/login", web::post().to(mock_login))
        .route("/auth/register", web::post().to(mock_register))
        .route("/products", web::get().to(mock_products))
        .route("/products", web::post().to(mock_create_product))
        .route("/products/sku/{sku}", web::get().to(mock_product_by_sku))
        .route("/products/{id}", web::put().to(mock_update_product))
        .route("/products/{id}/images", web::post().to(mock_upload_image))
        .route("/categories", web::get().to(mock_categories))
        .route("/categories", web::post().to(mock_create_category)),
    )
  })
  .workers(1)
  .disable_signals()
  .bind(("127.0.0.1", 0))
  .expect("bind mock backend");

  let addr = server.addrs()[0];
  let server = server.run();
  let handle = server.handle();
  actix_web::rt::spawn(server);

  MockBackend {
    base_url: format!("http://{}/api/v1/", addr),
    state,
    handle,
  }
}

// --- Storefront under test ---

pub fn test_config(api_url: &str) -> AppConfig {
  let vars: HashMap<&str, String> = [
    ("API_URL", api_url.to_string()),
    ("SESSION_AUTH_KEY", "integration-auth-secret".to_string()),
    ("SESSION_ENC_KEY", "integration-enc-secret".to_string()),
    ("SESSION_COOKIE_SECURE", "false".to_string()),
    ("CSRF_TOKEN_KEY", "integration-csrf-secret-of-32-chars".to_string()),
    ("STATIC_DIR", "static".to_string()),
  ]
  .into_iter()
  .collect();
  AppConfig::from_vars(|name| vars.get(name).cloned()).expect("test config")
}

pub fn test_state(api_url: &str) -> AppState {
  AppState::new(test_config(api_url)).expect("test state")
}

pub fn admin_identity() -> SessionIdentity {
  SessionIdentity {
    user_id: 1,
    email: "admin@example.com".to_string(),
    token: "admin-token".to_string(),
    authenticated: true,
    role: "admin".to_string(),
  }
}

pub fn customer_identity() -> SessionIdentity {
  SessionIdentity {
    user_id: 2,
    email: "ana@example.com".to_string(),
    token: "customer-token".to_string(),
    authenticated: true,
    role: "customer".to_string(),
  }
}

/// Keeps cookies across requests the way a browser would.
#[derive(Default)]
pub struct TestCookies {
  cookies: HashMap<String, Cookie<'static>>,
}

impl TestCookies {
  pub fn insert(&mut self, cookie: Cookie<'static>) {
    self.cookies.insert(cookie.name().to_string(), cookie);
  }

  pub fn absorb<B>(&mut self, resp: &ServiceResponse<B>) {
    for cookie in resp.response().cookies() {
      let expired = cookie.value().is_empty() || cookie.max_age().map(|age| age.is_negative()).unwrap_or(false);
      if expired {
        self.cookies.remove(cookie.name());
      } else {
        self.insert(cookie.into_owned());
      }
    }
  }

  pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
    self.cookies.get(name)
  }

  pub fn attach(&self, mut req: TestRequest) -> TestRequest {
    for cookie in self.cookies.values() {
      req = req.cookie(cookie.clone());
    }
    req
  }
}

pub async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
  String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf-8 body")
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
  resp
    .headers()
    .get("location")
    .and_then(|v| v.to_str().ok())
    .map(str::to_string)
}

/// Raw `Set-Cookie` header for `name`. Reading cookies back through the
/// parser clamps a negative `Max-Age` to zero, so expiry checks use this.
pub fn set_cookie_header<B>(resp: &ServiceResponse<B>, name: &str) -> Option<String> {
  let prefix = format!("{}=", name);
  resp
    .headers()
    .get_all(header::SET_COOKIE)
    .filter_map(|v| v.to_str().ok())
    .find(|v| v.starts_with(&prefix))
    .map(str::to_string)
}

/// Pulls the masked CSRF token out of a rendered form.
pub fn csrf_token_from(html: &str) -> String {
  let marker = "name=\"csrf_token\" value=\"";
  let start = html.find(marker).expect("csrf field in page") + marker.len();
  let end = start + html[start..].find('"').expect("closing quote");
  html[start..end].replace("&#x2F;", "/")
}

pub const MULTIPART_BOUNDARY: &str = "storefront-test-boundary";

/// Builds a multipart/form-data body. Files are `(field, file name, content)`.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
  let mut body = Vec::new();
  for (name, value) in fields {
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
  }
  for (name, file_name, content) in files {
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
      format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
        name, file_name
      )
      .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
  body
}

pub fn multipart_content_type() -> String {
  format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}
