//! Unit of Work - centralized repository access.
//!
//! Services depend on this trait instead of individual repositories,
//! so tests can swap the whole persistence layer in one place. Every
//! write in this system is a single-row statement whose consistency
//! rests on the email unique constraint, so no transaction scope is
//! exposed here.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{TokenRepository, TokenStore, UserRepository, UserStore};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get access token repository
    fn tokens(&self) -> Arc<dyn TokenRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    user_repo: Arc<UserStore>,
    token_repo: Arc<TokenStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            token_repo: Arc::new(TokenStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn tokens(&self) -> Arc<dyn TokenRepository> {
        self.token_repo.clone()
    }
}
