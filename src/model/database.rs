use std::path::Path;

use super::{
    queue::{self, Member, Queue, Status},
    session::{self, Session},
    unix_timestamp,
    user::{self, Role, User},
};
use log::{debug, info, trace};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row};

type Result<T> = SqlResult<Option<T>>;

pub struct Database {
    conn: Connection,
}

/// Build the database.
impl Database {
    /// Open (or create) the database at `path`. `":memory:"` gives a private
    /// in-memory database.
    pub fn open(path: impl AsRef<Path>) -> SqlResult<Database> {
        let conn = Connection::open(path)?;
        trace!("Opened database connection.");

        let db = Database { conn };
        db.init_db()?;
        Ok(db)
    }

    fn init_db(&self) -> SqlResult<()> {
        trace!("Initializing database...");

        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id         INTEGER PRIMARY KEY,
                email      TEXT NOT NULL UNIQUE,
                password   TEXT NOT NULL,
                role       TEXT NOT NULL DEFAULT 'student',
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id         INTEGER PRIMARY KEY,
                token      INTEGER NOT NULL UNIQUE,
                user_id    INTEGER NOT NULL REFERENCES users(id),
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS queues (
                id           INTEGER PRIMARY KEY,
                service_name TEXT NOT NULL,
                status       TEXT NOT NULL DEFAULT 'open',
                created_at   INTEGER NOT NULL
            );

            -- seq is arrival order; the UNIQUE user_id keeps everyone in at most one queue
            CREATE TABLE IF NOT EXISTS queue_members (
                seq      INTEGER PRIMARY KEY AUTOINCREMENT,
                queue_id INTEGER NOT NULL REFERENCES queues(id) ON DELETE CASCADE,
                user_id  INTEGER NOT NULL UNIQUE REFERENCES users(id)
            );",
        )?;

        info!("Finished initializing database");

        Ok(())
    }

    /// Run `f` inside one transaction. Any error rolls everything back.
    pub fn atomically<T, E>(
        &self,
        f: impl FnOnce(&Database) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

/// User stuff
impl Database {
    pub fn add_user(&self, user: &User) -> SqlResult<()> {
        debug!("Adding user {} to database", user.id);
        self.conn.execute(
            "INSERT INTO users (id, email, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                user.id,
                user.email.as_str(),
                user.password.as_str(),
                user.role,
                unix_timestamp(),
            ),
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &user::Id) -> Result<User> {
        debug!("Getting user {}", id);
        self.conn
            .query_row(
                "SELECT id, email, password, role FROM users WHERE id=?1",
                (id,),
                map_user,
            )
            .optional()
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        debug!("Getting user (email: {})", email);
        self.conn
            .query_row(
                "SELECT id, email, password, role FROM users WHERE email=?1",
                (email,),
                map_user,
            )
            .optional()
    }

    /// Returns whether the user existed.
    pub fn set_user_role(&self, id: &user::Id, role: Role) -> SqlResult<bool> {
        debug!("Setting role of user {} to {}", id, role);
        let changed = self
            .conn
            .execute("UPDATE users SET role=?1 WHERE id=?2", (role, id))?;
        Ok(changed > 0)
    }
}

/// Session stuff
impl Database {
    pub fn add_session(&self, session: &Session) -> SqlResult<()> {
        debug!("Adding session: {}", session.id);
        self.conn.execute(
            "INSERT INTO sessions (id, token, user_id, expires_at) VALUES (?1, ?2, ?3, ?4)",
            (session.id, session.token, session.user_id, session.expires_at),
        )?;
        Ok(())
    }

    pub fn get_session_from_token(&self, token: &session::Token) -> Result<Session> {
        trace!("Getting session from token");
        self.conn
            .query_row(
                "SELECT id, token, user_id, expires_at FROM sessions WHERE token=?1",
                (token,),
                |row| {
                    Ok(Session::new(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()
    }

    pub fn delete_session(&self, id: &session::Id) -> SqlResult<()> {
        debug!("Deleting session {}", id);
        self.conn
            .execute("DELETE FROM sessions WHERE id=?1", (id,))?;
        Ok(())
    }

    /// Drop every session that is expired at `now`. Returns how many went.
    pub fn delete_expired_sessions(&self, now: i64) -> SqlResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", (now,))?;
        if deleted > 0 {
            debug!("Purged {} expired sessions", deleted);
        }
        Ok(deleted)
    }
}

/// Queue stuff
impl Database {
    pub fn add_queue(&self, queue: &Queue) -> SqlResult<()> {
        debug!("Adding queue {} to database", queue.id);

        self.conn.execute(
            "INSERT INTO queues (id, service_name, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            (
                queue.id,
                queue.service_name.as_str(),
                queue.status,
                queue.created_at,
            ),
        )?;

        info!("Created queue {}: {}", queue.id, queue.service_name);

        Ok(())
    }

    pub fn get_queue(&self, id: &queue::Id) -> Result<Queue> {
        debug!("Getting queue {} from database", id);

        let queue = self
            .conn
            .query_row(
                "SELECT id, service_name, status, created_at FROM queues WHERE id=?1",
                (id,),
                map_queue,
            )
            .optional()?;

        match queue {
            Some(mut queue) => {
                queue.members = self.get_members(&queue.id)?;
                Ok(Some(queue))
            }
            None => Ok(None),
        }
    }

    /// All queues, oldest first, members included.
    pub fn get_queues(&self) -> SqlResult<Vec<Queue>> {
        trace!("Getting all queues");

        let mut stmt = self.conn.prepare(
            "SELECT id, service_name, status, created_at FROM queues ORDER BY created_at, id",
        )?;
        let mut queues = stmt
            .query_map((), map_queue)?
            .collect::<SqlResult<Vec<_>>>()?;

        for queue in queues.iter_mut() {
            queue.members = self.get_members(&queue.id)?;
        }

        Ok(queues)
    }

    /// Returns whether the queue existed.
    pub fn delete_queue(&self, id: &queue::Id) -> SqlResult<bool> {
        debug!("Deleting queue {}", id);

        self.conn
            .execute("DELETE FROM queue_members WHERE queue_id=?1", (id,))?;
        let deleted = self.conn.execute("DELETE FROM queues WHERE id=?1", (id,))?;

        Ok(deleted > 0)
    }

    /// Returns whether the queue existed.
    pub fn set_queue_status(&self, id: &queue::Id, status: Status) -> SqlResult<bool> {
        debug!("Setting status of queue {} to {}", id, status);
        let changed = self
            .conn
            .execute("UPDATE queues SET status=?1 WHERE id=?2", (status, id))?;
        Ok(changed > 0)
    }
}

/// Membership stuff
impl Database {
    fn get_members(&self, queue: &queue::Id) -> SqlResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.email, u.role
             FROM queue_members m JOIN users u ON u.id = m.user_id
             WHERE m.queue_id=?1
             ORDER BY m.seq",
        )?;
        let members = stmt
            .query_map((queue,), |row| {
                Ok(Member {
                    user: row.get(0)?,
                    email: row.get(1)?,
                    role: row.get(2)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>();

        members
    }

    /// Append `user` to the back of `queue`.
    ///
    /// Fails with a constraint violation if the user is already in any queue.
    pub fn add_member(&self, queue: &queue::Id, user: &user::Id) -> SqlResult<()> {
        debug!("Adding user {} to queue {}", user, queue);
        self.conn.execute(
            "INSERT INTO queue_members (queue_id, user_id) VALUES (?1, ?2)",
            (queue, user),
        )?;
        Ok(())
    }

    /// Returns whether the user was in the queue.
    pub fn remove_member(&self, queue: &queue::Id, user: &user::Id) -> SqlResult<bool> {
        debug!("Removing user {} from queue {}", user, queue);
        let removed = self.conn.execute(
            "DELETE FROM queue_members WHERE queue_id=?1 AND user_id=?2",
            (queue, user),
        )?;
        Ok(removed > 0)
    }

    /// The queue `user` is currently waiting in, if any.
    pub fn find_membership(&self, user: &user::Id) -> Result<queue::Id> {
        trace!("Looking up membership of user {}", user);
        self.conn
            .query_row(
                "SELECT queue_id FROM queue_members WHERE user_id=?1",
                (user,),
                |row| row.get(0),
            )
            .optional()
    }
}

fn map_user(row: &Row) -> SqlResult<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        role: row.get(3)?,
    })
}

fn map_queue(row: &Row) -> SqlResult<Queue> {
    trace!("Mapping db row to queue");

    Ok(Queue {
        id: row.get(0)?,
        service_name: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
        members: Vec::new(),
    })
}
