//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Database, UserRepository, UserStore};
use crate::services::{AuthService, Authenticator, TokenService, UserManager, UserService};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Database connection
    pub database: Arc<Database>,
    /// Whether the refresh cookie carries the `Secure` flag
    pub secure_cookies: bool,
}

impl AppState {
    /// Wire the SeaORM-backed services from the database and config.
    pub fn from_config(database: Arc<Database>, config: &Config) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new(database.clone()));
        let tokens = Arc::new(TokenService::new(&config.auth));

        Self {
            auth_service: Arc::new(Authenticator::new(users.clone(), tokens)),
            user_service: Arc::new(UserManager::new(users)),
            database,
            secure_cookies: config.secure_cookies(),
        }
    }

    /// Create application state with manually injected services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        database: Arc<Database>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            database,
            secure_cookies,
        }
    }
}
