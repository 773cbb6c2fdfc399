//! Authentication handlers.

use axum::{extract::State, response::Json, Extension};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::present_user;
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::TokenResponse;
use crate::types::{ApiResponse, Created, NoContent};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User display name
    #[validate(length(
        min = 1,
        max = MAX_NAME_LENGTH,
        message = "Name must be between 1 and 100 characters"
    ))]
    #[schema(example = "John Doe")]
    pub name: String,
    /// User email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = MAX_EMAIL_LENGTH, message = "Email must be at most 50 characters")
    )]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 6 characters)
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "Password must be at least 6 characters"
    ))]
    #[schema(example = "secret1", min_length = 6)]
    pub password: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret1")]
    pub password: String,
}

/// Successful authentication payload
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
    /// The authenticated user
    pub user: UserResponse,
}

impl AuthResponse {
    fn new(token: TokenResponse, user: UserResponse) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            user,
        }
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<AuthResponse>> {
    let (user, token) = state
        .auth_service
        .register(payload.name, payload.email, payload.password)
        .await?;

    let response = AuthResponse::new(token, present_user(user, &state.id_codec)?);
    Ok(Created(ApiResponse::with_message(
        response,
        "Registration successful",
    )))
}

/// Login and get a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let (user, token) = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    let response = AuthResponse::new(token, present_user(user, &state.id_codec)?);
    Ok(Json(ApiResponse::with_message(response, "Login successful")))
}

/// Logout, revoking every token of the caller
#[utoipa::path(
    get,
    path = "/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "All sessions revoked"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<NoContent> {
    state.auth_service.logout(current_user.id).await?;
    Ok(NoContent)
}
