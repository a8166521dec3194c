use crate::model::user;

use super::ServerMsg;

/// A push event and the user it is for. Every socket sees every message and
/// keeps only the ones addressed to its own user.
#[derive(Clone, Debug)]
pub struct BroadcastMsg {
    pub target: user::Id,
    pub content: ServerMsg,
}
