use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Server-side record of an issued refresh token.
///
/// Only a salted hash of the token is kept. A record is revoked by setting
/// `revoked_at`; it is never deleted or otherwise updated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Active iff not revoked and not yet expired at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// A refresh token about to be stored.
///
/// `created_at` and `expires_at` are stamped by the caller from one clock
/// reading, so the lifetime is exact.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
