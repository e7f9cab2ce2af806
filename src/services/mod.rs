//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on the repository trait, not on
//! the database directly.

mod auth_service;
pub mod token_service;
mod user_service;

// Service traits and implementations
pub use auth_service::{AuthService, AuthTokens, Authenticator, StepOneRegistration};
pub use token_service::{AccessClaims, RefreshClaims, TokenError, TokenService};
pub use user_service::{UserManager, UserService};
