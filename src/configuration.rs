use crate::error::ConfigError as SettingsError;

/// Cost below which bcrypt hashes are considered too cheap
pub const MIN_PASSWORD_HASH_COST: u32 = 10;
const MAX_PASSWORD_HASH_COST: u32 = 31;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing settings
///
/// Access and refresh tokens are signed with different secrets. The refresh
/// token lifetime is fixed (see `auth::REFRESH_TOKEN_TTL_DAYS`).
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64, // seconds (e.g., 900 for 15 minutes)
    pub issuer: String,
}

/// Session and cookie settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    #[serde(default = "default_refresh_cookie_name")]
    pub refresh_cookie_name: String,
    #[serde(default)]
    pub refresh_cookie_secure: bool,
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
    /// How many of a user's newest active records a refresh compares against
    #[serde(default = "default_refresh_scan_window")]
    pub refresh_scan_window: usize,
    /// How many of the newest unrevoked records logout compares against
    #[serde(default = "default_logout_scan_window")]
    pub logout_scan_window: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            refresh_cookie_name: default_refresh_cookie_name(),
            refresh_cookie_secure: false,
            password_hash_cost: default_password_hash_cost(),
            refresh_scan_window: default_refresh_scan_window(),
            logout_scan_window: default_logout_scan_window(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_refresh_cookie_name() -> String {
    "rt".to_string()
}

fn default_password_hash_cost() -> u32 {
    MIN_PASSWORD_HASH_COST
}

fn default_refresh_scan_window() -> usize {
    10
}

fn default_logout_scan_window() -> usize {
    50
}

impl Settings {
    /// Reject configurations that would weaken the session core
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.jwt.validate()?;
        self.auth.validate()
    }
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.access_secret.is_empty() {
            return Err(SettingsError::MissingRequired("jwt.access_secret".to_string()));
        }
        if self.refresh_secret.is_empty() {
            return Err(SettingsError::MissingRequired("jwt.refresh_secret".to_string()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(SettingsError::InvalidValue(
                "jwt.refresh_secret must differ from jwt.access_secret".to_string(),
            ));
        }
        if self.access_token_expiry <= 0 {
            return Err(SettingsError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.refresh_cookie_name.is_empty() {
            return Err(SettingsError::MissingRequired("auth.refresh_cookie_name".to_string()));
        }
        if !(MIN_PASSWORD_HASH_COST..=MAX_PASSWORD_HASH_COST).contains(&self.password_hash_cost) {
            return Err(SettingsError::InvalidValue(format!(
                "auth.password_hash_cost must be between {} and {}",
                MIN_PASSWORD_HASH_COST, MAX_PASSWORD_HASH_COST
            )));
        }
        if self.refresh_scan_window == 0 || self.logout_scan_window == 0 {
            return Err(SettingsError::InvalidValue(
                "auth scan windows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `configuration.{yaml,toml,json}` (optional) overlaid
/// with `APP_`-prefixed environment variables, e.g. `APP_JWT__ACCESS_SECRET`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
