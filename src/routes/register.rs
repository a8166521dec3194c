use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use axum_macros::debug_handler;
use log::{debug, info};

use crate::{
    auth::{self, Credentials},
    error::{Error, Result},
    model::{user::Role, AppState, User},
};

use super::sessions::AuthResponse;

const USER_EXISTS: &str = "User already exists";

#[debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(credentials) = payload?;
    let (email, password) = credentials.require()?;

    debug!("Got register request for user: {}", email);

    // Hash before taking the lock; argon2 is slow on purpose.
    let password = auth::hash::hash_password(&password)?;

    let database = state.database.lock().await;
    if database.get_user_by_email(&email)?.is_some() {
        return Err(Error::Conflict(USER_EXISTS.into()));
    }

    let user = User {
        id: state.next_snowflake()?,
        email,
        password,
        role: Role::Student,
    };
    database
        .add_user(&user)
        .map_err(|err| Error::on_constraint(err, USER_EXISTS))?;

    let session = auth::start_session(&state, &database, user.id)?;

    info!("Registered user {} ({})", user.id, user.email);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(session.token, user)),
    ))
}
