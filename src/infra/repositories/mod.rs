//! Repository layer - Data access abstraction
//!
//! The workflow only ever talks to `UserRepository`; `UserStore` is the
//! SeaORM-backed implementation.

pub mod entities;
mod user_repository;

pub use user_repository::{UserRepository, UserStore};

#[cfg(test)]
pub use user_repository::MockUserRepository;
