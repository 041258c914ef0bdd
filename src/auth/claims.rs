/// JWT Claims structure
///
/// Access and refresh tokens share one claim shape: the subject (user id)
/// and role, plus the standard RFC 7519 registered claims.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::Caller;
use crate::domain::Role;
use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Role at the time the token was issued
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Unique token id; makes every issued token distinct
    pub jti: String,
}

impl Claims {
    /// Create new claims for a user
    ///
    /// # Arguments
    /// * `user_id` - User's UUID
    /// * `role` - User's role
    /// * `expiry_seconds` - Token expiration in seconds from now
    /// * `issuer` - Issuer identifier
    pub fn new(user_id: Uuid, role: Role, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            role,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// A subject that is not a UUID makes the token invalid
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    /// The authenticated identity carried by the token
    pub fn caller(&self) -> Result<Caller, AppError> {
        Ok(Caller {
            user_id: self.user_id()?,
            role: self.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Role::Admin, 3600, "test".to_string());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_claims_are_unique() {
        let user_id = Uuid::new_v4();
        let a = Claims::new(user_id, Role::User, 3600, "test".to_string());
        let b = Claims::new(user_id, Role::User, 3600, "test".to_string());

        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_caller_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Role::User, 3600, "test".to_string());
        let caller = claims.caller().unwrap();

        assert_eq!(caller.user_id, user_id);
        assert_eq!(caller.role, Role::User);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Role::User, 3600, "test".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(
            claims.user_id(),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
    }
}
