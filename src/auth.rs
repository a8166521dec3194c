pub mod hash;
pub mod token;
mod verify_session;

pub use verify_session::verify_session;

use log::debug;

use crate::{
    error::Error,
    model::{unix_timestamp, user, AppState, Database, Session},
};

/// Email and password as a client sends them. Either may be missing.
#[derive(Clone, Default, serde::Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    /// The (**unhashed**) password
    #[serde(default)]
    pub password: Option<String>,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't print the password
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish()
    }
}

impl Credentials {
    /// Trimmed email and the password, or a validation error if either is
    /// missing or blank.
    pub fn require(self) -> Result<(String, String), Error> {
        let email = self.email.map(|email| email.trim().to_owned());
        match (email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok((email, password))
            }
            _ => Err(Error::Validation("Email and password required".into())),
        }
    }
}

/// Open a new session for `user_id`, valid for the configured token lifetime.
/// Sessions that have already run out are swept first.
pub fn start_session(
    state: &AppState,
    database: &Database,
    user_id: user::Id,
) -> Result<Session, Error> {
    database.delete_expired_sessions(unix_timestamp())?;

    let session = Session::generate(state.next_snowflake()?, user_id, state.settings.token_ttl);
    debug!("Starting session {} for user {}", session.id, user_id);
    database.add_session(&session)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_both_fields() {
        let missing = Credentials {
            email: Some("a@campus.edu".into()),
            password: None,
        };
        assert!(matches!(missing.require(), Err(Error::Validation(_))));

        let blank = Credentials {
            email: Some("   ".into()),
            password: Some("pw".into()),
        };
        assert!(matches!(blank.require(), Err(Error::Validation(_))));
    }

    #[test]
    fn credentials_trim_the_email() {
        let creds = Credentials {
            email: Some(" a@campus.edu ".into()),
            password: Some("pw".into()),
        };
        assert_eq!(
            creds.require().unwrap(),
            ("a@campus.edu".to_owned(), "pw".to_owned())
        );
    }

    #[tokio::test]
    async fn starting_a_session_sweeps_expired_ones() {
        use crate::{
            config::Settings,
            model::{database::tests as db, Snowflake},
        };

        let database = db::memory();
        let user = db::user(&database, 1, "a@campus.edu");
        let stale = Session::new(Snowflake::from(9), 77, user.id, unix_timestamp() - 1);
        database.add_session(&stale).unwrap();

        let state = AppState::new(db::memory(), Settings::default()).unwrap();
        let fresh = start_session(&state, &database, user.id).unwrap();

        assert!(database.get_session_from_token(&77).unwrap().is_none());
        assert!(database.get_session_from_token(&fresh.token).unwrap().is_some());
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials {
            email: Some("a@campus.edu".into()),
            password: Some("hunter2".into()),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
