use axum::extract::ws;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, trace};

use crate::{
    auth,
    model::{AppState, User},
};

use super::ServerMsg;

use msg::ClientMsg;

mod msg;

/// Read messages until the client presents a valid token. Failed attempts
/// are answered and the client may try again.
///
/// Returns `None` if the socket closes first.
pub(super) async fn authenticate<R, S, E>(
    receiver: &mut R,
    sender: &mut S,
    state: &AppState,
) -> Option<User>
where
    R: Stream<Item = Result<ws::Message, E>> + Unpin,
    S: Sink<ws::Message> + Unpin,
{
    while let Some(Ok(msg)) = receiver.next().await {
        if let ws::Message::Close(_) = msg {
            trace!("Client sent close frame before authenticating");
            return None;
        }

        let msg = match ClientMsg::build(msg.clone()) {
            Ok(msg) => msg,
            Err(err) => {
                // client sent invalid message, ignore
                debug!("client sent invalid message: {:?}\nError: {:?}", msg, err);
                continue;
            }
        };

        debug!("received message: {:?}", msg);

        let ClientMsg::Authenticate { token } = msg;
        if let Some(user) = verify(&token, state).await {
            return Some(user);
        }

        let reply = ServerMsg::Authenticated { success: false };
        if let Some(text) = reply.encode() {
            if sender.send(text).await.is_err() {
                return None;
            }
        }
    }

    None
}

async fn verify(token: &str, state: &AppState) -> Option<User> {
    let token = auth::token::parse_token(token)?;
    let database = state.database.lock().await;
    match auth::verify_session(token, &database) {
        Ok((_session, user)) => Some(user),
        Err(err) => {
            debug!("ws authentication failed: {}", err);
            None
        }
    }
}

/// Drain the socket once authenticated. Nothing a client sends after that
/// changes anything; this only notices when it leaves.
pub(super) async fn recv_ws<R, E>(mut receiver: R)
where
    R: Stream<Item = Result<ws::Message, E>> + Unpin,
{
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            ws::Message::Close(_) => {
                // client closing
                trace!("Client sent close frame");
                break;
            }
            ws::Message::Pong(_) => trace!("Client sent pong"),
            other => trace!("ignoring message from authenticated client: {:?}", other),
        }
    }
}
