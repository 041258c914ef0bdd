/// Middleware module
///
/// Request pipeline stages for authentication and role checks.

mod jwt_middleware;
mod role_guard;

pub use jwt_middleware::JwtMiddleware;
pub use role_guard::RequireRole;
