//! User resource handlers.
//!
//! The `/user` routes speak multipart on writes (the create and update
//! forms may carry an image file) and address individual records by
//! their encrypted identifier.

use std::path::Path as FilePath;

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::present_user;
use crate::api::extractors::format_validation_errors;
use crate::api::AppState;
use crate::config::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::domain::{UpdateProfile, UserResponse};
use crate::errors::{AppError, AppResult};
use crate::infra::ImageUpload;
use crate::types::{ApiResponse, Created, PageQuery, Paginated};

/// User creation form (multipart)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
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

/// User update form (multipart)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// User display name
    #[validate(length(
        min = 1,
        max = MAX_NAME_LENGTH,
        message = "Name must be between 1 and 100 characters"
    ))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// User email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = MAX_EMAIL_LENGTH, message = "Email must be at most 50 characters")
    )]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// New password; empty or absent keeps the current one
    #[schema(example = "secret2")]
    pub password: Option<String>,
}

/// Create user resource routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(store))
        .route(
            "/:id",
            get(show).put(update).patch(update).delete(destroy),
        )
}

/// Multipart form fields accepted by the create and update endpoints
#[derive(Default)]
struct UserForm {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    image: Option<ImageUpload>,
}

/// Drain a multipart request into its known fields, ignoring extras.
///
/// The stored extension comes from the client-supplied filename only;
/// an image part whose filename lacks one is rejected outright, never
/// inferred from the part's content type.
async fn parse_user_form(mut multipart: Multipart) -> AppResult<UserForm> {
    let mut form = UserForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "email" => form.email = Some(read_text(field).await?),
            "password" => form.password = Some(read_text(field).await?),
            "image" => {
                let extension = field
                    .file_name()
                    .and_then(|name| FilePath::new(name).extension())
                    .and_then(|ext| ext.to_str())
                    .map(str::to_lowercase)
                    .ok_or_else(|| {
                        AppError::bad_request("Image filename must carry an extension")
                    })?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.to_string()))?
                    .to_vec();
                form.image = Some(ImageUpload { data, extension });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))
}

/// List users, newest first
#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<u64>, Query, description = "1-indexed page number")
    ),
    responses(
        (status = 200, description = "One page of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Paginated<UserResponse>>>> {
    let (users, total) = state.user_service.list_users(query.page).await?;

    let responses = users
        .into_iter()
        .map(|user| present_user(user, &state.id_codec))
        .collect::<AppResult<Vec<_>>>()?;

    let page = Paginated::new(responses, query.page, total);
    Ok(Json(ApiResponse::with_message(page, "Users retrieved")))
}

/// Create a user (multipart, optional image part)
#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body(content = CreateUserRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn store(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Created<UserResponse>> {
    let form = parse_user_form(multipart).await?;

    let request = CreateUserRequest {
        name: form.name.unwrap_or_default(),
        email: form.email.unwrap_or_default(),
        password: form.password.unwrap_or_default(),
    };
    request
        .validate()
        .map_err(|e| AppError::validation(format_validation_errors(&e)))?;

    let user = state
        .user_service
        .create_user(request.name, request.email, request.password, form.image)
        .await?;

    let response = present_user(user, &state.id_codec)?;
    Ok(Created(ApiResponse::with_message(response, "User created")))
}

/// Fetch a single user by encrypted identifier
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Encrypted user identifier")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Malformed identifier"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn show(
    State(state): State<AppState>,
    Path(encoded_id): Path<String>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let id = state.id_codec.decode(&encoded_id)?;
    let user = state.user_service.get_user(id).await?;

    let response = present_user(user, &state.id_codec)?;
    Ok(Json(ApiResponse::with_message(response, "User retrieved")))
}

/// Update a user (multipart, optional image and password parts)
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Encrypted user identifier")
    ),
    request_body(content = UpdateUserRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error or malformed identifier"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(encoded_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    // Decode before validating, so a bad identifier never reads the body
    let id = state.id_codec.decode(&encoded_id)?;

    let form = parse_user_form(multipart).await?;
    let request = UpdateUserRequest {
        name: form.name.unwrap_or_default(),
        email: form.email.unwrap_or_default(),
        password: form.password,
    };
    request
        .validate()
        .map_err(|e| AppError::validation(format_validation_errors(&e)))?;

    let profile = UpdateProfile {
        name: request.name,
        email: request.email,
        password: request.password,
    };
    let user = state
        .user_service
        .update_user(id, profile, form.image)
        .await?;

    let response = present_user(user, &state.id_codec)?;
    Ok(Json(ApiResponse::with_message(response, "User updated")))
}

/// Delete a user by encrypted identifier
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Encrypted user identifier")
    ),
    responses(
        (status = 200, description = "User deleted", body = UserResponse),
        (status = 400, description = "Malformed identifier"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn destroy(
    State(state): State<AppState>,
    Path(encoded_id): Path<String>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let id = state.id_codec.decode(&encoded_id)?;
    let user = state.user_service.delete_user(id).await?;

    let response = present_user(user, &state.id_codec)?;
    Ok(Json(ApiResponse::with_message(response, "User deleted")))
}
