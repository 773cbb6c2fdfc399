//! Integration tests for the auth and user services.
//!
//! These run the real service implementations over an in-memory
//! persistence layer, so the full register/login/logout and user CRUD
//! flows are exercised without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use accounts_api::config::Config;
use accounts_api::domain::{NewUser, User, UserChanges};
use accounts_api::errors::{AppError, AppResult};
use accounts_api::infra::repositories::{TokenRepository, UserRepository};
use accounts_api::infra::{ImageStore, ImageUpload, UnitOfWork};
use accounts_api::services::{AuthService, Authenticator, UserManager, UserService};

// =============================================================================
// In-memory persistence layer
// =============================================================================

/// In-memory user store enforcing the email unique constraint the way
/// the real database does.
#[derive(Default)]
struct InMemoryUsers {
    rows: Mutex<Vec<User>>,
    next_id: Mutex<i32>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn email_taken(&self, email: &str, exclude: Option<i32>) -> AppResult<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.email == email && Some(u.id) != exclude))
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        // The unique constraint stays authoritative even if the
        // pre-check raced
        if rows.iter().any(|u| u.email == data.email) {
            return Err(AppError::conflict("Email"));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let now = Utc::now();
        let user = User {
            id: *next_id,
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            image: data.image,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound)?;

        user.name = changes.name;
        user.email = changes.email;
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(image) = changes.image {
            user.image = Some(image);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|u| u.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_page(&self, page: u64) -> AppResult<(Vec<User>, u64)> {
        let rows = self.rows.lock().unwrap();
        let mut sorted: Vec<User> = rows.clone();
        sorted.sort_by(|a, b| b.id.cmp(&a.id));

        let total = sorted.len() as u64;
        let start = ((page.saturating_sub(1)) * 5) as usize;
        let data = sorted.into_iter().skip(start).take(5).collect();
        Ok((data, total))
    }
}

/// In-memory token revocation store.
#[derive(Default)]
struct InMemoryTokens {
    live: Mutex<HashMap<Uuid, i32>>,
}

#[async_trait]
impl TokenRepository for InMemoryTokens {
    async fn create(&self, jti: Uuid, user_id: i32) -> AppResult<()> {
        self.live.lock().unwrap().insert(jti, user_id);
        Ok(())
    }

    async fn exists(&self, jti: Uuid) -> AppResult<bool> {
        Ok(self.live.lock().unwrap().contains_key(&jti))
    }

    async fn revoke_all_for_user(&self, user_id: i32) -> AppResult<u64> {
        let mut live = self.live.lock().unwrap();
        let before = live.len();
        live.retain(|_, owner| *owner != user_id);
        Ok((before - live.len()) as u64)
    }
}

struct InMemoryUow {
    users: Arc<InMemoryUsers>,
    tokens: Arc<InMemoryTokens>,
}

impl InMemoryUow {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            users: Arc::new(InMemoryUsers::default()),
            tokens: Arc::new(InMemoryTokens::default()),
        })
    }
}

impl UnitOfWork for InMemoryUow {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn tokens(&self) -> Arc<dyn TokenRepository> {
        self.tokens.clone()
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config() -> Config {
    // Debug builds fall back to development secrets
    Config::from_env()
}

fn auth_service(uow: Arc<InMemoryUow>) -> Authenticator<InMemoryUow> {
    Authenticator::new(uow, test_config())
}

fn user_service(uow: Arc<InMemoryUow>, dir: &std::path::Path) -> UserManager<InMemoryUow> {
    UserManager::new(uow, ImageStore::new(dir))
}

async fn register_ann(auth: &Authenticator<InMemoryUow>) -> (User, String) {
    let (user, token) = auth
        .register(
            "Ann".to_string(),
            "ann@x.com".to_string(),
            "secret1".to_string(),
        )
        .await
        .expect("registration should succeed");
    (user, token.access_token)
}

async fn error_body(err: AppError) -> Vec<u8> {
    use axum::response::IntoResponse;

    let response = err.into_response();
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect")
        .to_vec()
}

// =============================================================================
// Authentication flows
// =============================================================================

#[tokio::test]
async fn register_then_login_with_same_credentials() {
    let auth = auth_service(InMemoryUow::new());
    let (registered, _) = register_ann(&auth).await;

    let (user, token) = auth
        .login("ann@x.com".to_string(), "secret1".to_string())
        .await
        .expect("login should succeed");

    assert_eq!(user.id, registered.id);
    let claims = auth.verify_token(&token.access_token).await.unwrap();
    assert_eq!(claims.email, "ann@x.com");
}

#[tokio::test]
async fn duplicate_registration_has_exactly_one_winner() {
    let auth = auth_service(InMemoryUow::new());
    register_ann(&auth).await;

    let second = auth
        .register(
            "Other Ann".to_string(),
            "ann@x.com".to_string(),
            "secret2".to_string(),
        )
        .await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn login_failure_payload_does_not_leak_email_existence() {
    let auth = auth_service(InMemoryUow::new());
    register_ann(&auth).await;

    let wrong_password = auth
        .login("ann@x.com".to_string(), "wrong".to_string())
        .await
        .unwrap_err();
    let unknown_email = auth
        .login("ghost@x.com".to_string(), "secret1".to_string())
        .await
        .unwrap_err();

    // Identical over the wire: same HTTP body for both failure causes
    assert_eq!(error_body(wrong_password).await, error_body(unknown_email).await);
}

#[tokio::test]
async fn repeated_logins_accumulate_independent_tokens() {
    let auth = auth_service(InMemoryUow::new());
    let (_, first_token) = register_ann(&auth).await;

    let (_, second) = auth
        .login("ann@x.com".to_string(), "secret1".to_string())
        .await
        .unwrap();

    assert_ne!(first_token, second.access_token);
    // Both stay valid until logout
    assert!(auth.verify_token(&first_token).await.is_ok());
    assert!(auth.verify_token(&second.access_token).await.is_ok());
}

#[tokio::test]
async fn logout_revokes_every_session_and_is_idempotent() {
    let auth = auth_service(InMemoryUow::new());
    let (user, first_token) = register_ann(&auth).await;

    let (_, second) = auth
        .login("ann@x.com".to_string(), "secret1".to_string())
        .await
        .unwrap();

    let revoked = auth.logout(user.id).await.unwrap();
    assert_eq!(revoked, 2);

    assert!(auth.verify_token(&first_token).await.is_err());
    assert!(auth.verify_token(&second.access_token).await.is_err());

    // Logging out again with no live tokens is not an error
    assert_eq!(auth.logout(user.id).await.unwrap(), 0);
}

// =============================================================================
// User resource flows
// =============================================================================

#[tokio::test]
async fn listing_pages_newest_first_with_fixed_size() {
    let uow = InMemoryUow::new();
    let dir = tempfile::tempdir().unwrap();
    let users = user_service(uow, dir.path());

    for i in 0..7 {
        users
            .create_user(
                format!("User {}", i),
                format!("user{}@x.com", i),
                "secret1".to_string(),
                None,
            )
            .await
            .unwrap();
    }

    let (first_page, total) = users.list_users(1).await.unwrap();
    assert_eq!(total, 7);
    assert_eq!(first_page.len(), 5);
    assert_eq!(first_page[0].email, "user6@x.com");

    let (second_page, _) = users.list_users(2).await.unwrap();
    assert_eq!(second_page.len(), 2);
}

#[tokio::test]
async fn update_with_new_image_leaves_exactly_one_file() {
    let uow = InMemoryUow::new();
    let dir = tempfile::tempdir().unwrap();
    let users = user_service(uow, dir.path());

    // Different extensions keep the timestamp-based names distinct
    // within the same second
    let created = users
        .create_user(
            "Ann".to_string(),
            "ann@x.com".to_string(),
            "secret1".to_string(),
            Some(ImageUpload {
                data: b"first".to_vec(),
                extension: "png".to_string(),
            }),
        )
        .await
        .unwrap();
    assert!(created.image.is_some());

    let updated = users
        .update_user(
            created.id,
            accounts_api::domain::UpdateProfile {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
                password: None,
            },
            Some(ImageUpload {
                data: b"second".to_vec(),
                extension: "jpg".to_string(),
            }),
        )
        .await
        .unwrap();

    let stored = updated.image.expect("updated user keeps an image");
    assert!(stored.ends_with(".jpg"));

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files, vec![stored]);
}

#[tokio::test]
async fn deleting_a_user_echoes_the_removed_record() {
    let uow = InMemoryUow::new();
    let dir = tempfile::tempdir().unwrap();
    let users = user_service(uow, dir.path());

    let created = users
        .create_user(
            "Ann".to_string(),
            "ann@x.com".to_string(),
            "secret1".to_string(),
            None,
        )
        .await
        .unwrap();

    let deleted = users.delete_user(created.id).await.unwrap();
    assert_eq!(deleted.email, "ann@x.com");

    assert!(matches!(
        users.get_user(created.id).await,
        Err(AppError::NotFound)
    ));
}

// =============================================================================
// Full account lifecycle
// =============================================================================

#[tokio::test]
async fn ann_registration_walkthrough() {
    let auth = auth_service(InMemoryUow::new());

    // Register succeeds and yields a token
    let (_, first_token) = register_ann(&auth).await;
    assert!(!first_token.is_empty());

    // Same email again fails
    let duplicate = auth
        .register(
            "Ann".to_string(),
            "ann@x.com".to_string(),
            "secret1".to_string(),
        )
        .await;
    assert!(duplicate.is_err());

    // Wrong password fails
    let bad_login = auth
        .login("ann@x.com".to_string(), "wrong".to_string())
        .await;
    assert!(matches!(bad_login, Err(AppError::InvalidCredentials)));

    // Correct password yields a new, distinct token
    let (_, token) = auth
        .login("ann@x.com".to_string(), "secret1".to_string())
        .await
        .unwrap();
    assert_ne!(token.access_token, first_token);
}
