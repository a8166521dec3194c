//! Queue membership: creating and removing queues, joining and leaving them.
//!
//! Every function works on a [`Database`] the caller has already locked, so
//! a call sees and leaves the store in a consistent state. A user waits in at
//! most one queue at a time; [`join`] checks this and the storage layer
//! enforces it again with a unique index.

use log::{debug, info};

use crate::{
    error::{Error, Result},
    model::{
        queue::{self, Queue, Status},
        unix_timestamp, user, Database,
    },
};

const ALREADY_IN_QUEUE: &str = "Already in queue";
const ALREADY_IN_ANOTHER_QUEUE: &str =
    "You are already in another queue. Please leave that queue first.";

pub fn queue_not_found() -> Error {
    Error::NotFound("Queue not found".into())
}

pub fn list(database: &Database) -> Result<Vec<Queue>> {
    Ok(database.get_queues()?)
}

pub fn get(database: &Database, id: &queue::Id) -> Result<Queue> {
    database.get_queue(id)?.ok_or_else(queue_not_found)
}

/// A new, open, empty queue named `service_name` (trimmed).
pub fn create(database: &Database, id: queue::Id, service_name: &str) -> Result<Queue> {
    let service_name = service_name.trim();
    if service_name.is_empty() {
        return Err(Error::Validation("Service name required".into()));
    }

    let queue = Queue::new(id, service_name.to_owned(), unix_timestamp());
    database.add_queue(&queue)?;
    Ok(queue)
}

/// Removes the queue and everyone waiting in it.
pub fn delete(database: &Database, id: &queue::Id) -> Result<()> {
    database.atomically(|db| {
        if !db.delete_queue(id)? {
            return Err(queue_not_found());
        }
        info!("Deleted queue {}", id);
        Ok(())
    })
}

pub fn set_status(database: &Database, id: &queue::Id, status: Status) -> Result<Queue> {
    database.atomically(|db| {
        if !db.set_queue_status(id, status)? {
            return Err(queue_not_found());
        }
        get(db, id)
    })
}

/// Put `user` at the back of queue `id`.
///
/// The lookup, the checks and the append commit together, so nobody can
/// slip into a second queue between the check and the write.
pub fn join(database: &Database, id: &queue::Id, user: &user::Id) -> Result<Queue> {
    database.atomically(|db| {
        let queue = get(db, id)?;

        if queue.contains(user) {
            debug!("User {} is already in queue {}", user, id);
            return Err(Error::Conflict(ALREADY_IN_QUEUE.into()));
        }

        if let Some(other) = db.find_membership(user)? {
            debug!("User {} is already waiting in queue {}", user, other);
            return Err(Error::Conflict(ALREADY_IN_ANOTHER_QUEUE.into()));
        }

        if queue.status == Status::Closed {
            return Err(Error::Conflict("Queue is closed".into()));
        }

        db.add_member(id, user)
            .map_err(|err| Error::on_constraint(err, ALREADY_IN_ANOTHER_QUEUE))?;

        debug!("User {} joined queue {}", user, id);
        get(db, id)
    })
}

/// Take `user` out of queue `id`. Leaving a queue you aren't in is a no-op.
pub fn leave(database: &Database, id: &queue::Id, user: &user::Id) -> Result<Queue> {
    database.atomically(|db| {
        get(db, id)?;

        if db.remove_member(id, user)? {
            debug!("User {} left queue {}", user, id);
        }

        get(db, id)
    })
}
