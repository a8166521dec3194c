use std::sync::Arc;

use axum::{
    http::{header, header::InvalidHeaderValue, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::model::AppState;

mod auth;
mod queues;
mod register;
mod services;
mod sessions;
pub mod ws;

/// Every endpoint. Everything under `/queues` and `/auth/logout` needs a
/// bearer token; admin-only handlers check the role themselves.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/queues", get(queues::list).post(queues::create))
        .route("/queues/:id", get(queues::get).delete(queues::delete))
        .route("/queues/:id/status", put(queues::set_status))
        .route("/queues/join/:id", post(queues::join))
        .route("/queues/leave/:id", post(queues::leave))
        .route("/auth/logout", post(sessions::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/auth/register", post(register::register))
        .route("/auth/login", post(sessions::login))
        .route("/services", get(services::list))
        .route("/ws", get(ws::handler))
        .merge(protected)
        .with_state(state)
}

/// Let a browser client served from `origin` call the API with credentials.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = origin.parse::<HeaderValue>()?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}
