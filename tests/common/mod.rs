//! Shared test fixtures: an in-memory user store and app wiring.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use pampy_auth::api::{create_router, AppState};
use pampy_auth::config::AuthConfig;
use pampy_auth::domain::{NewUser, User};
use pampy_auth::errors::{AppError, AppResult};
use pampy_auth::infra::{Database, UserRepository};
use pampy_auth::services::{Authenticator, TokenService, UserManager};

pub const ACCESS_SECRET: &str = "integration-access-secret-0123456789";
pub const REFRESH_SECRET: &str = "integration-refresh-secret-0123456789";

/// User store backed by a HashMap, enforcing unique emails like the real table.
#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().remove(&id);
    }

    pub fn set_email(&self, id: Uuid, email: &str) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.email = email.to_string();
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::DuplicateEmail);
        }

        let user = User::from_new(Uuid::new_v4(), new_user);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let stored = users.get_mut(&user.id).ok_or(AppError::UserNotFound)?;
        *stored = user.clone();
        Ok(user.clone())
    }
}

pub fn token_service() -> Arc<TokenService> {
    let config = AuthConfig::new(
        ACCESS_SECRET,
        REFRESH_SECRET,
        Duration::hours(1),
        Duration::days(7),
    )
    .unwrap();
    Arc::new(TokenService::new(&config))
}

/// Everything a test needs to drive the app and inspect its state.
pub struct TestApp {
    pub router: axum::Router,
    pub users: Arc<InMemoryUsers>,
    pub tokens: Arc<TokenService>,
}

/// Wire the real services over the in-memory store.
///
/// `database_up` decides whether the health check's ping succeeds.
pub fn test_app(secure_cookies: bool, database_up: bool) -> TestApp {
    let users = Arc::new(InMemoryUsers::default());
    let tokens = token_service();

    let mut mock = MockDatabase::new(DatabaseBackend::Postgres);
    if database_up {
        mock = mock.append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]);
    }
    let database = Arc::new(Database::from_connection(mock.into_connection()));

    let repository: Arc<dyn UserRepository> = users.clone();
    let state = AppState::new(
        Arc::new(Authenticator::new(repository.clone(), tokens.clone())),
        Arc::new(UserManager::new(repository)),
        database,
        secure_cookies,
    );

    TestApp {
        router: create_router(state),
        users,
        tokens,
    }
}
