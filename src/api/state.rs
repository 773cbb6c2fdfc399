//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and
//! infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::IdCodec;
use crate::infra::{Database, ImageStore, Persistence};
use crate::services::{AuthService, Authenticator, UserManager, UserService};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Encrypted identifier codec
    pub id_codec: Arc<IdCodec>,
    /// Database connection
    pub database: Arc<Database>,
}

impl AppState {
    /// Create application state from a database connection and config.
    ///
    /// Wires the concrete services over the shared persistence layer;
    /// this is the production construction path.
    pub fn from_config(database: Arc<Database>, config: Config) -> Self {
        let uow = Arc::new(Persistence::new(database.get_connection()));
        let images = ImageStore::new(&config.upload_dir);
        let id_codec = Arc::new(IdCodec::new(config.app_key()));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), config)),
            user_service: Arc::new(UserManager::new(uow, images)),
            id_codec,
            database,
        }
    }

    /// Create application state with manually injected services.
    ///
    /// Used by tests to swap in mock services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        id_codec: Arc<IdCodec>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            id_codec,
            database,
        }
    }
}
