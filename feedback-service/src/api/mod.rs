//! JSON API under `/api`

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Json, Query},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::{
    error::{Error, Result},
    middleware::require_admin,
    responses::ApiMessage,
    state::AppState,
};

pub mod admin;
pub mod feedback;
pub mod stats;

const BANNER: &str = "Feedback Collector API is running...";

/// Every `/api` route; admin-only routes carry the [`require_admin`] guard
pub fn routes(state: &AppState) -> Router<AppState> {
    let guard = from_fn_with_state(state.clone(), require_admin);

    Router::new()
        .route("/api", get(banner))
        .route(
            "/api/feedback",
            get(feedback::list)
                .route_layer(guard.clone())
                .post(feedback::submit),
        )
        .route(
            "/api/feedback/filter",
            get(feedback::filter).route_layer(guard.clone()),
        )
        .route(
            "/api/feedback/{id}",
            get(feedback::show)
                .delete(feedback::remove)
                .route_layer(guard.clone()),
        )
        .route("/api/admin/register", post(admin::register))
        .route("/api/admin/login", post(admin::login))
        .route(
            "/api/admin/profile",
            get(admin::profile).route_layer(guard.clone()),
        )
        .route(
            "/api/admin/stats/dashboard",
            get(stats::dashboard).route_layer(guard.clone()),
        )
        .route(
            "/api/admin/stats/product/{product_name}",
            get(stats::product).route_layer(guard),
        )
}

async fn banner() -> ApiMessage {
    ApiMessage::new(BANNER)
}

/// Unwrap a JSON body, turning axum's rejection into the error envelope
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

/// Unwrap query parameters, turning axum's rejection into the error envelope
pub(crate) fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}
