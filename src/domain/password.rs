//! Password value object - Domain layer password handling.
//!
//! Salted bcrypt hashing with a fixed work factor.

use crate::config::{MIN_PASSWORD_LENGTH, PASSWORD_HASH_COST};
use crate::errors::{AppError, AppResult};

/// Password value object that handles hashing and verification.
///
/// Holds only the hash; the plain text never outlives `new`.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns a validation error if the password is too short, or an
    /// internal error if hashing fails.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let hash = bcrypt::hash(plain_text, PASSWORD_HASH_COST)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(Self { hash })
    }

    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// A stored hash that cannot be parsed never verifies.
    pub fn verify(&self, plain_text: &str) -> bool {
        bcrypt::verify(plain_text, &self.hash).unwrap_or(false)
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let plain = "abc123";
        let password = Password::new(plain).unwrap();

        assert!(password.verify(plain));
        assert!(!password.verify("wrong1"));
    }

    #[test]
    fn test_password_from_hash() {
        let plain = "secret42";
        let hash = Password::new(plain).unwrap().into_string();

        let restored = Password::from_hash(hash);
        assert!(restored.verify(plain));
    }

    #[test]
    fn test_hash_uses_fixed_cost() {
        let password = Password::new("abc123").unwrap();
        assert!(password.as_str().starts_with("$2b$10$"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let plain = "samepass1";
        let pass1 = Password::new(plain).unwrap();
        let pass2 = Password::new(plain).unwrap();

        assert_ne!(pass1.as_str(), pass2.as_str());
        assert!(pass1.verify(plain));
        assert!(pass2.verify(plain));
    }

    #[test]
    fn test_password_too_short() {
        let result = Password::new("ab12");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let password = Password::from_hash("not-a-bcrypt-hash");
        assert!(!password.verify("anything1"));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let password = Password::new("abc123").unwrap();
        let debug = format!("{:?}", password);
        assert!(!debug.contains(password.as_str()));
    }
}
