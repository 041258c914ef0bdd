/// Authentication Routes
///
/// Registration, login, token refresh, logout and current user information.
/// The refresh token travels only in an HTTP-only cookie scoped to `/auth`;
/// access tokens are returned in the body and sent back as bearer tokens.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::SessionManager;
use crate::authorization::Caller;
use crate::configuration::AuthSettings;
use crate::domain::UserProfile;
use crate::error::AppError;
use crate::store::Store;
use crate::validators::{is_valid_email, is_valid_name, validate_password};

/// Path every refresh cookie is scoped to
const AUTH_COOKIE_PATH: &str = "/auth";

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn refresh_cookie(settings: &AuthSettings, value: String) -> Cookie<'static> {
    Cookie::build(settings.refresh_cookie_name.clone(), value)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.refresh_cookie_secure)
        .path(AUTH_COOKIE_PATH)
        .finish()
}

fn presented_refresh_token(req: &HttpRequest, settings: &AuthSettings) -> Option<String> {
    req.cookie(&settings.refresh_cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /auth/register
///
/// # Validation
/// - Email must be valid format
/// - Name must be non-empty, without control characters
/// - Password must be 8 to 128 characters
///
/// # Errors
/// - 400: Validation errors
/// - 409: Email already registered
pub async fn register<S: Store>(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionManager<S>>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    validate_password(&form.password)?;

    let profile = sessions.register(&email, &name, &form.password).await?;

    Ok(HttpResponse::Created().json(profile))
}

/// POST /auth/login
///
/// Returns the access token and profile in the body and sets the refresh
/// token cookie.
///
/// # Errors
/// - 400: Validation error (invalid email format)
/// - 401: Invalid credentials (email not found or wrong password)
///
/// # Security Notes
/// - Uses same error message for "not found" and "wrong password"
pub async fn login<S: Store>(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager<S>>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let outcome = sessions.login(&email, &form.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&settings, outcome.refresh_token))
        .json(LoginResponse {
            access_token: outcome.access_token,
            user: outcome.user,
        }))
}

/// POST /auth/refresh
///
/// Exchanges the refresh token cookie for a new access token. The cookie is
/// left as it is.
///
/// # Errors
/// - 401: Missing, invalid, expired, revoked or unknown refresh token
pub async fn refresh<S: Store>(
    req: HttpRequest,
    sessions: web::Data<SessionManager<S>>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let token = presented_refresh_token(&req, &settings);

    let access_token = sessions.refresh(token.as_deref()).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { access_token }))
}

/// POST /auth/logout
///
/// Revokes the session behind the refresh token cookie, if any, and clears
/// the cookie. Always succeeds for well-formed requests.
pub async fn logout<S: Store>(
    req: HttpRequest,
    sessions: web::Data<SessionManager<S>>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let token = presented_refresh_token(&req, &settings);

    sessions.logout(token.as_deref()).await?;

    let mut removal = refresh_cookie(&settings, String::new());
    removal.make_removal();

    Ok(HttpResponse::Ok().cookie(removal).json(OkResponse {
        ok: true,
        message: None,
    }))
}

/// GET /auth/me
///
/// Profile of the bearer token's subject, or `null` if that user is gone.
pub async fn me<S: Store>(
    caller: web::ReqData<Caller>,
    sessions: web::Data<SessionManager<S>>,
) -> Result<HttpResponse, AppError> {
    let profile = sessions.current_user(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /auth/admin-only
///
/// Reachable only through the role guard.
pub async fn admin_only(caller: web::ReqData<Caller>) -> HttpResponse {
    tracing::debug!(user_id = %caller.user_id, "Admin-only route reached");
    HttpResponse::Ok().json(OkResponse {
        ok: true,
        message: Some("Hello admin".to_string()),
    })
}
