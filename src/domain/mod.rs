//! Domain layer - Core business entities and logic
//!
//! Users, their onboarding state and password handling. No infrastructure
//! dependencies beyond the error type.

pub mod password;
pub mod user;

pub use password::Password;
pub use user::{NewUser, ProfileDetails, RegistrationStatus, User, UserResponse, UserType};
