//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{
    STATUS_COMPLETED, STATUS_STEP1_COMPLETE, USER_TYPE_BUSINESS, USER_TYPE_REGULAR,
};

/// Kind of account, decides which profile fields step 2 collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Regular,
    Business,
}

impl UserType {
    pub fn is_business(&self) -> bool {
        matches!(self, UserType::Business)
    }
}

impl From<&str> for UserType {
    fn from(s: &str) -> Self {
        match s {
            USER_TYPE_BUSINESS => UserType::Business,
            _ => UserType::Regular,
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Regular => write!(f, "{}", USER_TYPE_REGULAR),
            UserType::Business => write!(f, "{}", USER_TYPE_BUSINESS),
        }
    }
}

/// Onboarding progress of a user record.
///
/// A record that does not exist yet is "unregistered"; the two-step flow
/// passes through `Step1Complete`, the single-step flow goes straight to
/// `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[serde(rename = "STEP1_COMPLETE")]
    Step1Complete,
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl RegistrationStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RegistrationStatus::Completed)
    }
}

impl From<&str> for RegistrationStatus {
    fn from(s: &str) -> Self {
        match s {
            STATUS_STEP1_COMPLETE => RegistrationStatus::Step1Complete,
            _ => RegistrationStatus::Completed,
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Step1Complete => write!(f, "{}", STATUS_STEP1_COMPLETE),
            RegistrationStatus::Completed => write!(f, "{}", STATUS_COMPLETED),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub business_type: Option<String>,
    pub status: RegistrationStatus,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a user from a creation request, as the store would persist it.
    pub fn from_new(id: Uuid, new_user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            user_type: new_user.user_type,
            business_type: new_user.business_type,
            status: new_user.status,
            first_name: None,
            last_name: None,
            phone_number: None,
            company_name: None,
            registration_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge step 2 profile details and mark the registration complete.
    ///
    /// Only the fields belonging to this user's type are taken; the rest are
    /// ignored. Absent fields keep their current value.
    pub fn complete_registration(&mut self, details: ProfileDetails) {
        match self.user_type {
            UserType::Regular => {
                merge(&mut self.first_name, details.first_name);
                merge(&mut self.last_name, details.last_name);
                merge(&mut self.phone_number, details.phone_number);
            }
            UserType::Business => {
                merge(&mut self.company_name, details.company_name);
                merge(&mut self.registration_number, details.registration_number);
            }
        }
        self.status = RegistrationStatus::Completed;
        self.updated_at = Utc::now();
    }
}

fn merge(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = value;
    }
}

/// Data needed to create a user record
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub business_type: Option<String>,
    pub status: RegistrationStatus,
}

impl NewUser {
    /// Record for the single-step flow: a regular user, registered at once.
    pub fn single_step(email: String, password_hash: String) -> Self {
        Self {
            email,
            password_hash,
            user_type: UserType::Regular,
            business_type: None,
            status: RegistrationStatus::Completed,
        }
    }

    /// Record for step 1 of the two-step flow.
    ///
    /// The business subtype is only kept for business users.
    pub fn step_one(
        email: String,
        password_hash: String,
        user_type: UserType,
        business_type: Option<String>,
    ) -> Self {
        Self {
            email,
            password_hash,
            user_type,
            business_type: business_type.filter(|_| user_type.is_business()),
            status: RegistrationStatus::Step1Complete,
        }
    }
}

/// Profile fields collected by step 2 of the two-step flow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub registration_number: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    pub registration_status: RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            user_type: user.user_type,
            business_type: user.business_type,
            registration_status: user.status,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            company_name: user.company_name,
            registration_number: user.registration_number,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ProfileDetails {
        ProfileDetails {
            first_name: Some("Ivan".into()),
            last_name: Some("Petrov".into()),
            phone_number: Some("+79990000000".into()),
            company_name: Some("Acme".into()),
            registration_number: Some("1027700132195".into()),
        }
    }

    fn user(user_type: UserType) -> User {
        User::from_new(
            Uuid::new_v4(),
            NewUser::step_one("a@b.com".into(), "hash".into(), user_type, Some("LLC".into())),
        )
    }

    #[test]
    fn test_regular_user_ignores_business_fields() {
        let mut user = user(UserType::Regular);
        user.complete_registration(details());

        assert_eq!(user.first_name.as_deref(), Some("Ivan"));
        assert_eq!(user.last_name.as_deref(), Some("Petrov"));
        assert_eq!(user.phone_number.as_deref(), Some("+79990000000"));
        assert_eq!(user.company_name, None);
        assert_eq!(user.registration_number, None);
        assert_eq!(user.status, RegistrationStatus::Completed);
    }

    #[test]
    fn test_business_user_ignores_personal_fields() {
        let mut user = user(UserType::Business);
        user.complete_registration(details());

        assert_eq!(user.company_name.as_deref(), Some("Acme"));
        assert_eq!(user.registration_number.as_deref(), Some("1027700132195"));
        assert_eq!(user.first_name, None);
        assert_eq!(user.phone_number, None);
        assert!(user.status.is_completed());
    }

    #[test]
    fn test_missing_fields_keep_existing_values() {
        let mut user = user(UserType::Regular);
        user.complete_registration(details());
        user.complete_registration(ProfileDetails {
            phone_number: Some("+70000000000".into()),
            ..Default::default()
        });

        assert_eq!(user.first_name.as_deref(), Some("Ivan"));
        assert_eq!(user.phone_number.as_deref(), Some("+70000000000"));
    }

    #[test]
    fn test_step_one_drops_business_type_for_regular() {
        let regular = NewUser::step_one(
            "a@b.com".into(),
            "h".into(),
            UserType::Regular,
            Some("LLC".into()),
        );
        let business = NewUser::step_one(
            "b@b.com".into(),
            "h".into(),
            UserType::Business,
            Some("LLC".into()),
        );

        assert_eq!(regular.business_type, None);
        assert_eq!(business.business_type.as_deref(), Some("LLC"));
        assert_eq!(regular.status, RegistrationStatus::Step1Complete);
    }

    #[test]
    fn test_single_step_is_completed_regular() {
        let new_user = NewUser::single_step("a@b.com".into(), "h".into());
        assert_eq!(new_user.user_type, UserType::Regular);
        assert!(new_user.status.is_completed());
    }

    #[test]
    fn test_enum_string_round_trip() {
        assert_eq!(UserType::from(UserType::Business.to_string().as_str()), UserType::Business);
        assert_eq!(
            RegistrationStatus::from(RegistrationStatus::Step1Complete.to_string().as_str()),
            RegistrationStatus::Step1Complete
        );
    }

    #[test]
    fn test_user_type_wire_format() {
        assert_eq!(serde_json::to_string(&UserType::Business).unwrap(), "\"BUSINESS\"");
        let parsed: UserType = serde_json::from_str("\"REGULAR\"").unwrap();
        assert_eq!(parsed, UserType::Regular);
    }
}
