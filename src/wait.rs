//! Wait estimation. Every member ahead of you, yourself included, is assumed
//! to take the same fixed time at the counter.

use crate::model::{
    queue::{self, Queue, Status},
    user,
};

/// Minutes the counter spends on one member.
pub const MINUTES_PER_MEMBER: u64 = 5;

/// Estimated wait in minutes for the member at 1-based `position`.
pub fn estimated_wait(position: usize) -> u64 {
    position as u64 * MINUTES_PER_MEMBER
}

/// A queue as clients see it, each member tagged with position and wait.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub id: queue::Id,
    pub service_name: String,
    pub status: Status,
    pub created_at: i64,
    pub members: Vec<MemberView>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: user::Id,
    pub email: String,
    pub role: user::Role,
    pub position: usize,
    /// Minutes.
    pub estimated_wait: u64,
}

pub fn annotate(queue: Queue) -> QueueView {
    let members = queue
        .members
        .into_iter()
        .enumerate()
        .map(|(index, member)| {
            let position = index + 1;
            MemberView {
                id: member.user,
                email: member.email,
                role: member.role,
                position,
                estimated_wait: estimated_wait(position),
            }
        })
        .collect();

    QueueView {
        id: queue.id,
        service_name: queue.service_name,
        status: queue.status,
        created_at: queue.created_at,
        members,
    }
}
