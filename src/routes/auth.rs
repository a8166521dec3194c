use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State, TypedHeader},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use log::{debug, trace};

use crate::{
    auth,
    error::Error,
    model::{AppState, User},
};

/// Resolve the bearer token to a user and stash both the [`Session`] and the
/// [`CurrentUser`] in the request extensions.
///
/// [`Session`]: crate::model::Session
pub async fn authenticate<B>(
    State(state): State<Arc<AppState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, Error> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        trace!("No bearer token found");
        return Err(Error::Unauthorized("Not authorized, token missing".into()));
    };

    let Some(token) = auth::token::parse_token(bearer.token()) else {
        debug!("Malformed bearer token");
        return Err(Error::Unauthorized("Not authorized, token invalid".into()));
    };

    let (session, user) = {
        let database = state.database.lock().await;
        auth::verify_session(token, &database)?
    };

    trace!("Request authenticated as user {}", user.id);

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(CurrentUser(user));

    // Continue
    Ok(next.run(request).await)
}

/// The caller, as resolved by [`authenticate`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Not authorized, token missing".into()))
    }
}

/// The caller, who must be an admin.
#[derive(Clone, Debug)]
pub struct Admin(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            debug!("User {} ({}) is not an admin", user.id, user.role);
            return Err(Error::Forbidden("Admin access only".into()));
        }
        Ok(Admin(user))
    }
}
