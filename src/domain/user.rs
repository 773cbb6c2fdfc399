//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored filename of the user's avatar (None = no image)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the user has an avatar on record
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Data required to create a user record.
/// The password here is already hashed; plaintext never reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub image: Option<String>,
}

/// Field changes applied on update.
///
/// `name` and `email` are always replaced; `password_hash` and `image`
/// are replaced only when `Some`.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub image: Option<String>,
}

/// Profile fields accepted from an update request, before hashing.
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub name: String,
    pub email: String,
    /// Non-empty value replaces the stored hash; empty/absent keeps it
    pub password: Option<String>,
}

/// User response (safe to return to client).
///
/// The `id` field carries the encrypted form of the primary key,
/// matching what the `/user/{id}` routes accept.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Opaque user identifier
    #[schema(example = "lZ8yTq3vW0cN5xR2dH7mKgE")]
    pub id: String,
    /// User display name
    #[schema(example = "John Doe")]
    pub name: String,
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Stored avatar filename, if any
    #[schema(example = "1700000000.png")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    /// Build a response from a user and its pre-encoded identifier.
    pub fn new(user: User, encoded_id: String) -> Self {
        Self {
            id: encoded_id,
            name: user.name,
            email: user.email,
            image: user.image,
            created_at: user.created_at,
        }
    }
}
