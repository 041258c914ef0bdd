//! Create or refresh the administrator account.
//!
//! Reads `ADMIN_EMAIL` and `ADMIN_PASSWORD` (defaults `admin@test.pl` and
//! `admin1234`). Running it again resets the name, password and role.

use sqlx::postgres::PgPoolOptions;
use storefront::auth::PasswordHasher;
use storefront::configuration::get_configuration;
use storefront::error::{AppError, ConfigError};
use storefront::store::PgStore;
use storefront::telemetry::init_telemetry;
use storefront::validators::{is_valid_email, validate_password};

const DEFAULT_ADMIN_EMAIL: &str = "admin@test.pl";
const DEFAULT_ADMIN_PASSWORD: &str = "admin1234";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_telemetry();

    let configuration = get_configuration()
        .map_err(|e| AppError::Config(ConfigError::InvalidValue(e.to_string())))?;
    configuration.auth.validate()?;

    let email = is_valid_email(&env_or("ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL))?;
    let password = env_or("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD);
    validate_password(&password)?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&configuration.database.connection_string())
        .await?;
    let store = PgStore::new(pool);
    store.migrate().await?;

    let hasher = PasswordHasher::new(configuration.auth.password_hash_cost);
    let password_hash = hasher.hash_blocking(password).await?;
    let admin = store.upsert_admin(&email, "Admin", &password_hash).await?;

    tracing::info!(user_id = %admin.id, email = %admin.email, role = %admin.role, "Admin account ready");
    Ok(())
}
