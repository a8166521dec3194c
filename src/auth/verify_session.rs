use log::debug;

use crate::{
    error::Error,
    model::{session::Token, unix_timestamp, Database, Session, User},
};

/// Resolve a bearer token to its live session and user.
///
/// Expired sessions are deleted on the way out.
pub fn verify_session(token: Token, database: &Database) -> Result<(Session, User), Error> {
    let Some(session) = database.get_session_from_token(&token)? else {
        debug!("Session for presented token not found in database");
        return Err(Error::Unauthorized("Not authorized, token invalid".into()));
    };

    if session.is_expired_at(unix_timestamp()) {
        debug!("Session {} expired", session.id);
        database.delete_session(&session.id)?;
        return Err(Error::Unauthorized("Not authorized, token expired".into()));
    }

    match database.get_user(&session.user_id)? {
        Some(user) => Ok((session, user)),
        None => {
            debug!("User {} of session {} not found", session.user_id, session.id);
            Err(Error::Unauthorized("User not found".into()))
        }
    }
}
