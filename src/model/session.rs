use std::time::Duration;

use crate::auth;

use super::{unix_timestamp, Snowflake};

pub type Id = Snowflake;
pub type Token = i64;

#[derive(Clone, Debug, serde::Serialize)]
pub struct Session {
    pub id: Id,
    #[serde(skip)] // Don't expose token to client
    pub token: Token,
    pub user_id: super::user::Id,
    /// Unix seconds after which the token is refused.
    pub expires_at: i64,
}

impl Session {
    pub fn new(id: Id, token: Token, user_id: super::user::Id, expires_at: i64) -> Session {
        Session {
            id,
            token,
            user_id,
            expires_at,
        }
    }

    /// A fresh session with a random token, valid for `ttl` from now.
    pub fn generate(id: Id, user_id: super::user::Id, ttl: Duration) -> Session {
        let token = auth::token::generate_token();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = unix_timestamp().saturating_add(ttl);

        Session {
            id,
            token,
            user_id,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_session_expires_after_ttl() {
        let week = Duration::from_secs(7 * 24 * 60 * 60);
        let session = Session::generate(Snowflake::from(1), Snowflake::from(2), week);
        let now = unix_timestamp();

        assert!(session.token >= 0);
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + week.as_secs() as i64 + 1));
    }
}
