//! Infrastructure layer - External systems integration
//!
//! Database connection, migrations and the user repository.

pub mod db;
pub mod repositories;

pub use db::{Database, Migrator};
pub use repositories::{UserRepository, UserStore};
