/// JWT token creation and validation
///
/// Session tokens are HS256-signed and carry only the user id; role, team,
/// and admin capability are loaded fresh from the database on every request,
/// so a role change takes effect immediately rather than at token expiry.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::jwt::{create_token, validate_token};
/// use uuid::Uuid;
///
/// let secret = "test-secret-key-at-least-32-chars-long";
/// let user_id = Uuid::new_v4();
///
/// let token = create_token(user_id, secret).unwrap();
/// let claims = validate_token(&token, secret).unwrap();
/// assert_eq!(claims.sub, user_id.to_string());
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token issuer claim value
const ISSUER: &str = "taskdeck";

/// Session lifetime
const TOKEN_EXPIRY_DAYS: i64 = 30;

/// Errors that can occur during JWT operations
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreationFailed(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid user ID in token")]
    InvalidUserId,
}

/// JWT claims for a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID as a string
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued-at (unix timestamp)
    pub iat: i64,

    /// Expiry (unix timestamp)
    pub exp: i64,

    /// Not-before (unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Parses the subject claim back into a user id
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        self.sub.parse().map_err(|_| JwtError::InvalidUserId)
    }
}

/// Creates a signed session token for a user
///
/// # Errors
///
/// Returns [`JwtError::CreationFailed`] if signing fails.
pub fn create_token(user_id: Uuid, secret: &str) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_EXPIRY_DAYS)).timestamp(),
        nbf: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreationFailed(e.to_string()))
}

/// Validates a token's signature, expiry, and issuer
///
/// # Errors
///
/// Returns [`JwtError::Expired`] for an expired token and
/// [`JwtError::InvalidToken`] for any other validation failure.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::InvalidToken(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-chars-long";

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(Uuid::new_v4(), SECRET).unwrap();
        let result = validate_token(&token, "a-completely-different-secret-key-here");
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            validate_token("not-a-jwt", SECRET),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expiry_is_thirty_days() {
        let token = create_token(Uuid::new_v4(), SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 30 * 24 * 60 * 60);
    }
}
