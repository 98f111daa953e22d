use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::mailer::{LogMailer, Mailer};

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub tokens: TokenIssuer,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self::with_mailer(pool, config, Arc::new(LogMailer))
    }

    pub fn with_mailer(pool: SqlitePool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            tokens: TokenIssuer::from_config(&config),
            pool,
            config: Arc::new(config),
            mailer,
        }
    }
}
