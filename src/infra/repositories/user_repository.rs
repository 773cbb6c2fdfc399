//! User repository - persistence for user records.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::config::PAGE_SIZE;
use crate::domain::{NewUser, User, UserChanges};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Check whether an email is already in use, optionally excluding
    /// one record (the row being updated)
    async fn email_taken(&self, email: &str, exclude: Option<i32>) -> AppResult<bool>;

    /// Create a new user
    async fn create(&self, data: NewUser) -> AppResult<User>;

    /// Apply field changes to an existing user
    async fn update(&self, id: i32, changes: UserChanges) -> AppResult<User>;

    /// Delete user by ID
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Fetch one page of users ordered by descending ID, together with
    /// the total record count. Pages are 1-indexed and hold [`PAGE_SIZE`]
    /// records.
    async fn list_page(&self, page: u64) -> AppResult<(Vec<User>, u64)>;
}

/// Concrete implementation of UserRepository backed by SeaORM
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map a write error, surfacing the unique email constraint as a
/// conflict. The constraint is authoritative under concurrent writes:
/// a racing duplicate that passes the pre-check still loses here.
fn map_write_err(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Email"),
        _ => AppError::from(e),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn email_taken(&self, email: &str, exclude: Option<i32>) -> AppResult<bool> {
        let mut query = UserEntity::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query.count(&self.db).await.map_err(AppError::from)?;
        Ok(count > 0)
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            name: Set(data.name),
            email: Set(data.email),
            password_hash: Set(data.password_hash),
            image: Set(data.image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(map_write_err)?;
        Ok(User::from(model))
    }

    async fn update(&self, id: i32, changes: UserChanges) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = user.into();

        active.name = Set(changes.name);
        active.email = Set(changes.email);
        if let Some(hash) = changes.password_hash {
            active.password_hash = Set(hash);
        }
        if let Some(image) = changes.image {
            active.image = Set(Some(image));
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await.map_err(map_write_err)?;
        Ok(User::from(model))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_page(&self, page: u64) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, PAGE_SIZE);

        let total = paginator.num_items().await.map_err(AppError::from)?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(AppError::from)?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }
}
