/// Refresh Token Lifetime

use chrono::{DateTime, Duration, Utc};

/// Refresh tokens and their records expire this many days after login
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Expiry of a record created at `created_at`
pub fn refresh_expiry(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(REFRESH_TOKEN_TTL_DAYS)
}
