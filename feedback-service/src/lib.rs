//! # feedback-service
//!
//! Product feedback collector: a public submission form and JSON API, plus an
//! authenticated admin dashboard with aggregate statistics.
//!
//! ## Features
//!
//! - **REST API**: feedback submission, listing, filtering and deletion under `/api`
//! - **Admin accounts**: first-admin registration, Argon2 passwords, JWT bearer tokens
//! - **Statistics**: dashboard totals, per-product breakdowns and rating distributions
//! - **Web pages**: askama-rendered form and dashboard with an SVG bar chart
//! - **Storage**: in-memory store by default, SurrealDB behind the `surrealdb` feature
//! - **Middleware stack**: request ids, sensitive header masking, panic recovery, body limits
//! - **Health checks**: liveness and readiness probes
//!
//! ## Example
//!
//! ```rust,no_run
//! use feedback_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config);
//!
//!     let stores = Stores::open(&config.store).await?;
//!     let state = AppState::new(config.clone(), stores)?;
//!
//!     Server::new(config).serve(app(state)).await?;
//!     Ok(())
//! }
//! ```

use axum::{routing::get, Router};

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod model;
pub mod observability;
pub mod responses;
pub mod server;
pub mod services;
pub mod state;
pub mod stats;
pub mod store;
pub mod validation;
pub mod web;

use crate::{error::Error, state::AppState};

/// The complete router: JSON API, web pages and health probes
///
/// The tower-http stack is added by [`server::Server::serve`].
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(&state))
        .merge(web::routes(&state.config.session))
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> Error {
    Error::NotFound("Route not found".to_string())
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::health::{health, readiness};
    pub use crate::middleware::{AuthenticatedAdmin, Claims, JwtAuth};
    pub use crate::model::{Admin, Feedback, Product, Rating};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::responses::Success;
    pub use crate::server::Server;
    pub use crate::services::{AdminService, FeedbackQuery, FeedbackService};
    pub use crate::state::AppState;
    pub use crate::stats::StatsService;
    pub use crate::store::Stores;

    pub use axum::{
        routing::{delete, get, post},
        Json, Router,
    };
}
