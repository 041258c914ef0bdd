/// Authentication module
///
/// Token issuing/verification, password hashing, refresh token storage
/// helpers, and the session manager that ties them to the store.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::Claims;
pub use jwt::{TokenIssuer, TokenKind};
pub use password::PasswordHasher;
pub use refresh_token::{refresh_expiry, REFRESH_TOKEN_TTL_DAYS};
pub use session::{LoginOutcome, SessionManager};
