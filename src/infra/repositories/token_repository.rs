//! Access token repository - the bearer-token revocation store.
//!
//! A token is live while its `jti` row exists. Logout removes every
//! row belonging to the user, so all sessions die together.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::entities::access_token::{self, ActiveModel, Entity as TokenEntity};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Token repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Record a newly issued token
    async fn create(&self, jti: Uuid, user_id: i32) -> AppResult<()>;

    /// Check whether a token is still live (not revoked)
    async fn exists(&self, jti: Uuid) -> AppResult<bool>;

    /// Revoke every token belonging to a user; returns the revoked
    /// count (zero when the user holds no tokens - not an error)
    async fn revoke_all_for_user(&self, user_id: i32) -> AppResult<u64>;
}

/// Concrete implementation of TokenRepository backed by SeaORM
pub struct TokenStore {
    db: DatabaseConnection,
}

impl TokenStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenRepository for TokenStore {
    async fn create(&self, jti: Uuid, user_id: i32) -> AppResult<()> {
        let active_model = ActiveModel {
            id: Set(jti),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now()),
        };

        active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn exists(&self, jti: Uuid) -> AppResult<bool> {
        let result = TokenEntity::find_by_id(jti)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.is_some())
    }

    async fn revoke_all_for_user(&self, user_id: i32) -> AppResult<u64> {
        let result = TokenEntity::delete_many()
            .filter(access_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }
}
