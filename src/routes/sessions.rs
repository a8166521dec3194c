use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    Extension,
};
use axum_macros::debug_handler;
use log::debug;

use crate::{
    auth::{self, Credentials},
    error::{Error, Result},
    model::{session::Token, AppState, Session, User},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// What register and login hand back: a bearer token and who it belongs to.
#[derive(Debug, serde::Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl AuthResponse {
    pub fn new(token: Token, user: User) -> AuthResponse {
        AuthResponse {
            token: token.to_string(),
            user,
        }
    }
}

#[debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(credentials) = payload?;
    let (email, password) = credentials.require()?;

    debug!("Got login request for user: {}", email);

    let user = state.database.lock().await.get_user_by_email(&email)?;
    let Some(user) = user else {
        debug!("User not found: {}", email);
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    // Check password
    if !auth::hash::check_passwords(&password, &user.password) {
        debug!("Password incorrect for user: {}", user.email);
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let database = state.database.lock().await;
    let session = auth::start_session(&state, &database, user.id)?;
    debug!("Logging in user with session {}", session.id);

    Ok(Json(AuthResponse::new(session.token, user)))
}

#[debug_handler]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode> {
    debug!("Logging out session: {}", session.id);

    let database = state.database.lock().await;
    database.delete_session(&session.id)?;

    Ok(StatusCode::NO_CONTENT)
}
