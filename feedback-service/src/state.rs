//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    auth::{load_secret, JwtGenerator, PasswordHasher},
    config::Config,
    error::Result,
    middleware::JwtAuth,
    services::{AdminService, FeedbackService},
    stats::StatsService,
    store::Stores,
};

/// Everything a handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub jwt_auth: JwtAuth,
    pub feedback: FeedbackService,
    pub admins: AdminService,
    pub stats: StatsService,
}

impl AppState {
    /// Wire services over `stores`, resolving the JWT secret from `config`
    pub fn new(config: Config, stores: Stores) -> Result<Self> {
        let secret = load_secret(&config.jwt)?;
        Self::with_secret(config, stores, &secret)
    }

    /// Same as [`AppState::new`] with an explicit signing secret
    pub fn with_secret(config: Config, stores: Stores, secret: &[u8]) -> Result<Self> {
        let jwt_auth = JwtAuth::new(&config.jwt, secret)?;
        let tokens = JwtGenerator::new(&config.jwt, secret)?;
        let hasher = PasswordHasher::new(&config.auth.password)?;

        let feedback = FeedbackService::new(stores.feedback.clone());
        let admins = AdminService::new(stores.admins.clone(), hasher, tokens);
        let stats = StatsService::new(stores.feedback.clone(), config.stats.recent_window_days);

        Ok(Self {
            config: Arc::new(config),
            stores,
            jwt_auth,
            feedback,
            admins,
            stats,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
