/// JWT Token Issuing and Verification
///
/// Two token kinds share the claim shape in `Claims` but are signed with
/// different secrets, so a refresh token is never accepted as an access
/// token and vice versa.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::auth::REFRESH_TOKEN_TTL_DAYS;
use crate::authorization::Caller;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, authorizes ordinary API calls
    Access,
    /// Long-lived, only exchanged for new access tokens
    Refresh,
}

#[derive(Clone)]
pub struct TokenIssuer {
    settings: JwtSettings,
}

impl TokenIssuer {
    pub fn new(settings: JwtSettings) -> Self {
        Self { settings }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.settings.access_secret.as_bytes(),
            TokenKind::Refresh => self.settings.refresh_secret.as_bytes(),
        }
    }

    /// Lifetime of a token kind in seconds
    pub fn lifetime(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.settings.access_token_expiry,
            TokenKind::Refresh => REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60,
        }
    }

    /// Sign a new token of `kind` for `caller`
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn issue(&self, kind: TokenKind, caller: &Caller) -> Result<String, AppError> {
        let claims = Claims::new(
            caller.user_id,
            caller.role,
            self.lifetime(kind),
            self.settings.issuer.clone(),
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature, expiry and issuer of a token of `kind`
    ///
    /// # Errors
    /// Every failure (bad signature, malformed payload, expiry, wrong
    /// issuer) collapses into `AuthError::TokenInvalid`.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        decode::<Claims>(token, &DecodingKey::from_secret(self.secret(kind)), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(kind = ?kind, "JWT validation error: {}", e);
                AppError::Auth(AuthError::TokenInvalid)
            })
    }
}
