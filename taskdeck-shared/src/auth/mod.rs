/// Authentication primitives
///
/// - [`jwt`]: HS256 session tokens carrying only the user id
/// - [`password`]: Argon2id hashing and the password length policy

pub mod jwt;
pub mod password;

pub use jwt::{create_token, validate_token, Claims, JwtError};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
