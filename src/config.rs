use std::env;
use std::fmt;

/// Runtime configuration, read once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub reset_token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub frontend_url: String,
    pub cors_origin: String,
    pub seed_admin_email: String,
    pub seed_admin_password: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn var_or(key: &'static str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://workboard.db"),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            jwt_secret,
            access_token_ttl_minutes: parse_var("JWT_ACCESS_TTL_MINUTES", 60)?,
            refresh_token_ttl_days: parse_var("JWT_REFRESH_TTL_DAYS", 30)?,
            reset_token_ttl_hours: parse_var("RESET_TOKEN_TTL_HOURS", 24)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),
            cors_origin: var_or("CORS_ORIGIN", "http://localhost:3000"),
            seed_admin_email: var_or("SEED_ADMIN_EMAIL", "admin@x.com"),
            seed_admin_password: var_or("SEED_ADMIN_PASSWORD", "admin123"),
        })
    }

    /// Configuration for tests: in-memory database and the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            server_port: 0,
            server_host: "127.0.0.1".to_string(),
            jwt_secret: "test-secret-for-workboard".to_string(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 30,
            reset_token_ttl_hours: 24,
            bcrypt_cost: 4,
            frontend_url: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            seed_admin_email: "admin@x.com".to_string(),
            seed_admin_password: "admin123".to_string(),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
