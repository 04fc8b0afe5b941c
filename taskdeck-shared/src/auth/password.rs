/// Password hashing and verification using Argon2id
///
/// Hashes are stored in PHC string format, so parameters and salt travel
/// with the hash and can be upgraded without a migration.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse battery staple").unwrap();
/// assert!(verify_password("correct horse battery staple", &hash).unwrap());
/// assert!(!verify_password("wrong password", &hash).unwrap());
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during password operations
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    TooShort,
}

/// Hashes a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Verifies a password against a stored hash
///
/// # Errors
///
/// Returns [`PasswordError::InvalidHash`] if the stored hash cannot be
/// parsed; a wrong password is `Ok(false)`, not an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Checks a candidate password against the length policy
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("my-secret-password").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("my-secret-password", &hash).unwrap());
        assert!(!verify_password("not-my-password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_strength_policy() {
        assert!(validate_password_strength("12345678").is_ok());
        assert!(matches!(
            validate_password_strength("1234567"),
            Err(PasswordError::TooShort)
        ));
    }
}
