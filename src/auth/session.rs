/// Session Manager
///
/// Registration, login, refresh and logout. Each login opens an independent
/// session backed by one refresh-token record; a record goes from active to
/// revoked (logout) or expires on its own, and never comes back.
///
/// The raw refresh token only ever exists in the login response and in the
/// requests that present it. The store keeps a salted hash, so presented
/// tokens are matched by hashing against a bounded window of candidates.

use chrono::Utc;
use std::fmt;
use uuid::Uuid;

use crate::auth::jwt::{TokenIssuer, TokenKind};
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::refresh_expiry;
use crate::authorization::Caller;
use crate::configuration::{AuthSettings, JwtSettings};
use crate::domain::{NewRefreshToken, NewUser, RefreshTokenRecord, Role, UserProfile};
use crate::error::{AppError, AppResult, AuthError};
use crate::store::{RefreshTokenRepository, UserRepository};

const EMAIL_TAKEN: &str = "Email already in use";

/// Result of a successful login
pub struct LoginOutcome {
    pub access_token: String,
    /// Raw refresh token, to be handed to the client and nowhere else
    pub refresh_token: String,
    pub user: UserProfile,
}

impl fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutcome")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("user", &self.user)
            .finish()
    }
}

pub struct SessionManager<S> {
    store: S,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    refresh_window: usize,
    logout_window: usize,
}

impl<S> SessionManager<S>
where
    S: UserRepository + RefreshTokenRepository,
{
    pub fn new(store: S, jwt: JwtSettings, auth: &AuthSettings) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(auth.password_hash_cost),
            tokens: TokenIssuer::new(jwt),
            refresh_window: auth.refresh_scan_window.max(1),
            logout_window: auth.logout_scan_window.max(1),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create a USER account
    ///
    /// # Errors
    /// - Conflict if the email is taken, whether caught by the lookup or by
    ///   the store's unique constraint on a concurrent insert
    pub async fn register(&self, email: &str, name: &str, password: &str) -> AppResult<UserProfile> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }

        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;

        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::conflict(EMAIL_TAKEN)
                } else {
                    e
                }
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.profile())
    }

    /// Verify credentials and open a new session
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email and for a wrong password alike
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_ok = self
            .hasher
            .verify_blocking(password.to_string(), user.password_hash.clone())
            .await?;
        if !password_ok {
            return Err(AuthError::InvalidCredentials.into());
        }

        let caller = Caller {
            user_id: user.id,
            role: user.role,
        };
        let access_token = self.tokens.issue(TokenKind::Access, &caller)?;
        let refresh_token = self.tokens.issue(TokenKind::Refresh, &caller)?;

        let token_hash = self.hasher.hash_blocking(refresh_token.clone()).await?;
        let issued_at = Utc::now();
        self.store
            .create_refresh_token(NewRefreshToken {
                user_id: user.id,
                token_hash,
                created_at: issued_at,
                expires_at: refresh_expiry(issued_at),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            access_token,
            refresh_token,
            user: user.profile(),
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The refresh token itself is not rotated.
    ///
    /// # Errors
    /// - `MissingToken` when nothing is presented
    /// - `TokenInvalid` for any signature, payload or expiry failure
    /// - `TokenNotRecognized` when no active record among the subject's
    ///   newest `refresh_scan_window` matches
    pub async fn refresh(&self, presented: Option<&str>) -> AppResult<String> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(TokenKind::Refresh, token)?;
        let caller = claims.caller()?;

        let candidates = self
            .store
            .find_active_refresh_tokens(caller.user_id, Utc::now(), self.refresh_window)
            .await?;

        if self.find_match(candidates, token).await?.is_none() {
            tracing::warn!(user_id = %caller.user_id, "Refresh token not recognized");
            return Err(AuthError::TokenNotRecognized.into());
        }

        let access_token = self.tokens.issue(TokenKind::Access, &caller)?;
        tracing::info!(user_id = %caller.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the session a refresh token belongs to
    ///
    /// Best effort: no token, or a token that matches none of the newest
    /// `logout_scan_window` unrevoked records, is not an error. The token is
    /// not signature-checked first.
    pub async fn logout(&self, presented: Option<&str>) -> AppResult<()> {
        let Some(token) = presented.filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        let candidates = self
            .store
            .find_unrevoked_refresh_tokens(self.logout_window)
            .await?;

        match self.find_match(candidates, token).await? {
            Some(record) => {
                self.store
                    .revoke_refresh_token(record.id, Utc::now())
                    .await?;
                tracing::info!(user_id = %record.user_id, "Session revoked");
            }
            None => {
                tracing::debug!("Logout token matched no active session");
            }
        }
        Ok(())
    }

    /// Public profile of a token subject, `None` if the user no longer exists
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self
            .store
            .find_user_by_id(user_id)
            .await?
            .map(|user| user.profile()))
    }

    /// First record, in the given order, whose hash matches `token`
    async fn find_match(
        &self,
        candidates: Vec<RefreshTokenRecord>,
        token: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        for record in candidates {
            match self
                .hasher
                .verify_blocking(token.to_string(), record.token_hash.clone())
                .await
            {
                Ok(true) => return Ok(Some(record)),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(record_id = %record.id, error = %e, "Unreadable refresh token hash");
                }
            }
        }
        Ok(None)
    }
}
