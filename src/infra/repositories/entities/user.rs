//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{RegistrationStatus, User, UserType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub business_type: Option<String>,
    pub registration_status: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            user_type: UserType::from(model.user_type.as_str()),
            business_type: model.business_type,
            status: RegistrationStatus::from(model.registration_status.as_str()),
            first_name: model.first_name,
            last_name: model.last_name,
            phone_number: model.phone_number,
            company_name: model.company_name,
            registration_number: model.registration_number,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
