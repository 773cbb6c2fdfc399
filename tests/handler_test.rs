//! Router-level tests for the HTTP layer.
//!
//! These drive requests through the full router with mock services, so
//! they cover what the service-level tests cannot: route wiring, the
//! bearer-auth middleware, JSON validation rejections, multipart form
//! parsing and the encoded-identifier path parameters.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

use accounts_api::api::{create_router, AppState};
use accounts_api::domain::{IdCodec, UpdateProfile, User};
use accounts_api::errors::{AppError, AppResult};
use accounts_api::infra::{Database, ImageUpload};
use accounts_api::services::{AuthService, Claims, TokenResponse, UserService};

const TEST_KEY: &[u8; 32] = b"test-app-key-32-bytes-padding-ok";
const TEST_TOKEN: &str = "valid-test-token";

// =============================================================================
// Mock Services
// =============================================================================

fn sample_user(id: i32) -> User {
    User {
        id,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        password_hash: "hashed".to_string(),
        image: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn token_response() -> TokenResponse {
    TokenResponse {
        access_token: "mock-token".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 86400,
    }
}

/// Mock auth service accepting exactly one bearer token
struct MockAuthService;

#[async_trait]
impl AuthService for MockAuthService {
    async fn register(
        &self,
        name: String,
        email: String,
        _password: String,
    ) -> AppResult<(User, TokenResponse)> {
        let mut user = sample_user(1);
        user.name = name;
        user.email = email;
        Ok((user, token_response()))
    }

    async fn login(&self, email: String, _password: String) -> AppResult<(User, TokenResponse)> {
        let mut user = sample_user(1);
        user.email = email;
        Ok((user, token_response()))
    }

    async fn logout(&self, _user_id: i32) -> AppResult<u64> {
        Ok(1)
    }

    async fn verify_token(&self, token: &str) -> AppResult<Claims> {
        if token == TEST_TOKEN {
            Ok(Claims {
                sub: 1,
                email: "test@example.com".to_string(),
                jti: Uuid::new_v4(),
                exp: Utc::now().timestamp() + 3600,
                iat: Utc::now().timestamp(),
            })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Mock user service echoing its inputs back
struct MockUserService;

#[async_trait]
impl UserService for MockUserService {
    async fn list_users(&self, _page: u64) -> AppResult<(Vec<User>, u64)> {
        Ok((vec![sample_user(2), sample_user(1)], 2))
    }

    async fn create_user(
        &self,
        name: String,
        email: String,
        _password: String,
        image: Option<ImageUpload>,
    ) -> AppResult<User> {
        let mut user = sample_user(1);
        user.name = name;
        user.email = email;
        user.image = image.map(|upload| format!("1700000000.{}", upload.extension));
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        Ok(sample_user(id))
    }

    async fn update_user(
        &self,
        id: i32,
        profile: UpdateProfile,
        _image: Option<ImageUpload>,
    ) -> AppResult<User> {
        let mut user = sample_user(id);
        user.name = profile.name;
        user.email = profile.email;
        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> AppResult<User> {
        Ok(sample_user(id))
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

fn app() -> Router {
    let state = AppState::new(
        Arc::new(MockAuthService),
        Arc::new(MockUserService),
        Arc::new(IdCodec::new(TEST_KEY)),
        Arc::new(Database::from_connection(DatabaseConnection::default())),
    );
    create_router(state)
}

fn bearer(request: axum::http::request::Builder) -> axum::http::request::Builder {
    request.header(header::AUTHORIZATION, format!("Bearer {}", TEST_TOKEN))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect")
        .to_vec()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}

const BOUNDARY: &str = "x-test-boundary";

fn text_part(name: &str, value: &str) -> String {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

fn image_part(filename: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\npng-bytes\r\n"
    )
}

fn multipart_request(uri: &str, method: &str, parts: &[String]) -> Request<Body> {
    let mut body = parts.concat();
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    bearer(Request::builder().method(method).uri(uri))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn user_form_parts(filename: Option<&str>) -> Vec<String> {
    let mut parts = vec![
        text_part("name", "Test User"),
        text_part("email", "test@example.com"),
        text_part("password", "secret1"),
    ];
    if let Some(filename) = filename {
        parts.push(image_part(filename));
    }
    parts
}

// =============================================================================
// Routing & middleware
// =============================================================================

#[tokio::test]
async fn root_returns_the_welcome_banner() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Welcome to Accounts API");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    // No Authorization header
    let request = Request::builder().uri("/user").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong scheme
    let request = Request::builder()
        .uri("/user")
        .header(header::AUTHORIZATION, format!("Token {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown token
    let request = Request::builder()
        .uri("/user")
        .header(header::AUTHORIZATION, "Bearer forged")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_answers_no_content() {
    let request = bearer(Request::builder().uri("/logout"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// =============================================================================
// User listing & encoded identifiers
// =============================================================================

#[tokio::test]
async fn listing_users_wraps_the_page_in_the_envelope() {
    let request = bearer(Request::builder().uri("/user"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], true);
    assert_eq!(json["data"]["meta"]["per_page"], 5);
    assert_eq!(json["data"]["data"].as_array().unwrap().len(), 2);
    // Identifiers go out encoded, never as raw integers
    assert!(json["data"]["data"][0]["id"].is_string());
}

#[tokio::test]
async fn fetching_a_user_round_trips_its_encoded_id() {
    let codec = IdCodec::new(TEST_KEY);
    let encoded = codec.encode(7).unwrap();

    let request = bearer(Request::builder().uri(format!("/user/{}", encoded)))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let returned = json["data"]["id"].as_str().unwrap();
    assert_eq!(codec.decode(returned).unwrap(), 7);
}

#[tokio::test]
async fn malformed_identifier_is_rejected_before_lookup() {
    let request = bearer(Request::builder().uri("/user/not-a-real-token"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["status"], false);
    assert_eq!(json["error"], "INVALID_ID");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn register_rejects_an_overlong_email() {
    // Valid shape, one character past the limit
    let email = format!("{}@example.com", "a".repeat(45));
    assert!(email.len() > 50);

    let payload = serde_json::json!({
        "name": "Test User",
        "email": email,
        "password": "secret1",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert!(json["message"].as_str().unwrap().contains("at most 50"));
}

// =============================================================================
// Multipart forms
// =============================================================================

#[tokio::test]
async fn creating_a_user_parses_the_multipart_form() {
    let request = multipart_request("/user", "POST", &user_form_parts(Some("avatar.png")));
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["status"], true);
    assert_eq!(json["data"]["email"], "test@example.com");
    assert!(json["data"]["image"].as_str().unwrap().ends_with(".png"));
}

#[tokio::test]
async fn image_filename_without_extension_is_rejected() {
    let request = multipart_request("/user", "POST", &user_form_parts(Some("avatar")));
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn updating_a_user_accepts_a_form_without_image_or_password() {
    let encoded = IdCodec::new(TEST_KEY).encode(3).unwrap();
    let parts = vec![
        text_part("name", "Renamed User"),
        text_part("email", "renamed@example.com"),
    ];

    let request = multipart_request(&format!("/user/{}", encoded), "PUT", &parts);
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["name"], "Renamed User");
    assert_eq!(json["data"]["email"], "renamed@example.com");
}
