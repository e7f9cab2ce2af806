//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr};
use std::sync::Arc;
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User};
use crate::errors::{AppError, AppResult};
use crate::infra::db::Database;

#[cfg(test)]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address (exact, case-sensitive match)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a new user.
    ///
    /// Fails with `DuplicateEmail` when the store's unique index rejects
    /// the email, which settles concurrent sign-ups for the same address.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Persist the mutable fields of an existing user
    async fn update(&self, user: &User) -> AppResult<User>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(self.db.connection())
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.connection())
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            user_type: Set(new_user.user_type.to_string()),
            business_type: Set(new_user.business_type),
            registration_status: Set(new_user.status.to_string()),
            first_name: Set(None),
            last_name: Set(None),
            phone_number: Set(None),
            company_name: Set(None),
            registration_number: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.db.connection()).await.map_err(insert_error)?;
        Ok(User::from(model))
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let existing = UserEntity::find_by_id(user.id)
            .one(self.db.connection())
            .await?
            .ok_or(AppError::UserNotFound)?;

        let mut active: ActiveModel = existing.into();
        active.user_type = Set(user.user_type.to_string());
        active.business_type = Set(user.business_type.clone());
        active.registration_status = Set(user.status.to_string());
        active.first_name = Set(user.first_name.clone());
        active.last_name = Set(user.last_name.clone());
        active.phone_number = Set(user.phone_number.clone());
        active.company_name = Set(user.company_name.clone());
        active.registration_number = Set(user.registration_number.clone());
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.db.connection()).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }
}

/// Map an insert failure, surfacing unique violations as duplicate emails.
fn insert_error(err: DbErr) -> AppError {
    let sql_err = err.sql_err();
    classify_insert_error(err, sql_err)
}

fn classify_insert_error(err: DbErr, sql_err: Option<SqlErr>) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "Insert rejected by unique index");
            AppError::DuplicateEmail
        }
        _ => AppError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RegistrationStatus, UserType};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

    fn store(connection: DatabaseConnection) -> UserStore {
        UserStore::new(Arc::new(Database::from_connection(connection)))
    }

    fn model(email: &str) -> user::Model {
        let now = chrono::Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "$2b$10$hash".to_string(),
            user_type: "BUSINESS".to_string(),
            business_type: Some("LLC".to_string()),
            registration_status: "STEP1_COMPLETE".to_string(),
            first_name: None,
            last_name: None,
            phone_number: None,
            company_name: None,
            registration_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_by_email_maps_model() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model("a@b.com")]])
            .into_connection();

        let user = store(db)
            .find_by_email("a@b.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.user_type, UserType::Business);
        assert_eq!(user.status, RegistrationStatus::Step1Complete);
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = store(db).find_by_id(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_returns_inserted_user() {
        let inserted = model("new@b.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![inserted.clone()]])
            .into_connection();

        let user = store(db)
            .create(NewUser::single_step("new@b.com".into(), "$2b$10$hash".into()))
            .await
            .unwrap();

        assert_eq!(user.id, inserted.id);
        assert_eq!(user.email, "new@b.com");
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let user = User::from(model("ghost@b.com"));
        let result = store(db).update(&user).await;

        assert!(matches!(result, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_store_failure_is_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();

        let result = store(db).find_by_email("a@b.com").await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_create_failure_is_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();

        let result = store(db)
            .create(NewUser::single_step("new@b.com".into(), "$2b$10$hash".into()))
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_unique_violation_is_duplicate_email() {
        let err = classify_insert_error(
            DbErr::Custom("duplicate key value violates unique constraint".into()),
            Some(SqlErr::UniqueConstraintViolation(
                "Key (email)=(a@b.com) already exists.".into(),
            )),
        );
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[test]
    fn test_other_constraint_violation_stays_database_error() {
        let err = classify_insert_error(
            DbErr::Custom("insert or update violates foreign key constraint".into()),
            Some(SqlErr::ForeignKeyConstraintViolation("fk".into())),
        );
        assert!(matches!(err, AppError::Database(_)));
    }
}
