//! User service - CRUD use cases over user records.
//!
//! Orchestrates the credential store, password hashing and image
//! storage. Identifier decoding happens at the handler boundary; this
//! layer only ever sees raw ids.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{NewUser, Password, UpdateProfile, User, UserChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{ImageStore, ImageUpload, UnitOfWork};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Fetch one page of users (newest first) with the total count
    async fn list_users(&self, page: u64) -> AppResult<(Vec<User>, u64)>;

    /// Create a user, hashing the password and storing the image if given
    async fn create_user(
        &self,
        name: String,
        email: String,
        password: String,
        image: Option<ImageUpload>,
    ) -> AppResult<User>;

    /// Get user by ID
    async fn get_user(&self, id: i32) -> AppResult<User>;

    /// Update profile fields; replaces the stored image when a new one
    /// is supplied and re-hashes the password when non-empty
    async fn update_user(
        &self,
        id: i32,
        profile: UpdateProfile,
        image: Option<ImageUpload>,
    ) -> AppResult<User>;

    /// Delete a user and return the removed record
    async fn delete_user(&self, id: i32) -> AppResult<User>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    images: ImageStore,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service instance with Unit of Work and image store
    pub fn new(uow: Arc<U>, images: ImageStore) -> Self {
        Self { uow, images }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn list_users(&self, page: u64) -> AppResult<(Vec<User>, u64)> {
        self.uow.users().list_page(page).await
    }

    async fn create_user(
        &self,
        name: String,
        email: String,
        password: String,
        image: Option<ImageUpload>,
    ) -> AppResult<User> {
        if self.uow.users().email_taken(&email, None).await? {
            return Err(AppError::conflict("Email"));
        }

        // Canonical contract: the password is hashed before it can
        // reach the store, with no plaintext variant.
        let password_hash = Password::new(&password)?.into_string();

        let stored_image = match &image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };

        self.uow
            .users()
            .create(NewUser {
                name,
                email,
                password_hash,
                image: stored_image,
            })
            .await
    }

    async fn get_user(&self, id: i32) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found()
    }

    async fn update_user(
        &self,
        id: i32,
        profile: UpdateProfile,
        image: Option<ImageUpload>,
    ) -> AppResult<User> {
        let existing = self.uow.users().find_by_id(id).await?.ok_or_not_found()?;

        // Uniqueness check excludes the record being updated
        if self.uow.users().email_taken(&profile.email, Some(id)).await? {
            return Err(AppError::conflict("Email"));
        }

        // Store the replacement first, then drop the old file. Not
        // transactional with the record write; a crash in between can
        // orphan a file on disk.
        let new_image = match &image {
            Some(upload) => {
                let filename = self.images.save(upload).await?;
                if let Some(old) = &existing.image {
                    self.images.remove(old).await?;
                }
                Some(filename)
            }
            None => None,
        };

        // Empty password means "keep the current one"
        let password_hash = match profile.password.as_deref() {
            Some(plain) if !plain.is_empty() => Some(Password::new(plain)?.into_string()),
            _ => None,
        };

        self.uow
            .users()
            .update(
                id,
                UserChanges {
                    name: profile.name,
                    email: profile.email,
                    password_hash,
                    image: new_image,
                },
            )
            .await
    }

    async fn delete_user(&self, id: i32) -> AppResult<User> {
        let user = self.uow.users().find_by_id(id).await?.ok_or_not_found()?;

        self.uow.users().delete(id).await?;
        Ok(user)
    }
}
