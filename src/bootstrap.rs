//! Seeding the first admin account from the command line.

use log::info;

use crate::{
    auth::{self, Credentials},
    error::Error,
    model::{user::Role, AppState, User},
};

/// Create an admin account for `email`. If the email is already registered
/// that account is promoted instead and keeps its password.
pub async fn create_admin(state: &AppState, email: &str, password: &str) -> Result<User, Error> {
    let credentials = Credentials {
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
    };
    let (email, password) = credentials.require()?;

    let database = state.database.lock().await;

    if let Some(mut user) = database.get_user_by_email(&email)? {
        database.set_user_role(&user.id, Role::Admin)?;
        user.role = Role::Admin;
        info!("Promoted user {} ({}) to admin", user.id, user.email);
        return Ok(user);
    }

    let user = User {
        id: state.next_snowflake()?,
        email,
        password: auth::hash::hash_password(&password)?,
        role: Role::Admin,
    };
    database.add_user(&user)?;

    info!("Admin created: {} ({})", user.id, user.email);

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Settings, model::database::tests as db};

    #[tokio::test]
    async fn creates_a_fresh_admin() {
        let state = AppState::new(db::memory(), Settings::default()).unwrap();

        let admin = create_admin(&state, " admin@campus.edu ", "password123")
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let database = state.database.lock().await;
        let stored = database.get_user_by_email("admin@campus.edu").unwrap().unwrap();
        assert!(stored.is_admin());
        assert!(auth::hash::check_passwords("password123", &stored.password));
    }

    #[tokio::test]
    async fn promotes_an_existing_user() {
        let database = db::memory();
        let student = db::user(&database, 1, "staff@campus.edu");
        let state = AppState::new(database, Settings::default()).unwrap();

        let admin = create_admin(&state, "staff@campus.edu", "ignored").await.unwrap();
        assert_eq!(admin.id, student.id);

        let database = state.database.lock().await;
        let stored = database.get_user(&student.id).unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert_eq!(stored.password, "hash");
    }

    #[tokio::test]
    async fn needs_credentials() {
        let state = AppState::new(db::memory(), Settings::default()).unwrap();
        assert!(matches!(
            create_admin(&state, "", "password123").await,
            Err(Error::Validation(_))
        ));
    }
}
