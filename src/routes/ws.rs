use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{self, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use axum_macros::debug_handler;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, error, trace};
use tokio::{sync::broadcast, time};

use crate::model::AppState;

pub use broadcast_msg::BroadcastMsg;

mod broadcast_handler;
mod broadcast_msg;
mod recv;

pub type Sender = broadcast::Sender<BroadcastMsg>;

pub const TURN_MESSAGE: &str = "It's almost your turn!";

/// How long a fresh socket gets to present its token.
const AUTH_DEADLINE: Duration = Duration::from_secs(30);

#[debug_handler]
pub async fn handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    trace!("ws connection requested");
    ws.on_upgrade(|ws| handle_ws(ws, state))
}

async fn handle_ws(ws: WebSocket, state: Arc<AppState>) {
    trace!("ws connection opened");

    let (sender, receiver) = ws.split();
    serve_socket(receiver, sender, state, AUTH_DEADLINE).await;
}

/// Drive one socket: wait up to `deadline` for a valid token, then forward
/// that user's events until either side goes away.
async fn serve_socket<R, S, E>(
    mut receiver: R,
    mut sender: S,
    state: Arc<AppState>,
    deadline: Duration,
) where
    R: Stream<Item = Result<ws::Message, E>> + Unpin + Send + 'static,
    S: Sink<ws::Message> + Unpin + Send + 'static,
    E: Send + 'static,
{
    let authenticated =
        time::timeout(deadline, recv::authenticate(&mut receiver, &mut sender, &state)).await;

    let user = match authenticated {
        Ok(Some(user)) => user,
        Ok(None) => {
            trace!("ws connection closed before authenticating");
            return;
        }
        Err(_) => {
            debug!(
                "ws did not authenticate within {}, closing",
                humantime::format_duration(deadline)
            );
            if sender.send(ws::Message::Close(None)).await.is_err() {
                trace!("ws already gone");
            }
            return;
        }
    };

    // Subscribe before acknowledging so nothing sent after the ack is missed.
    let rx = state.tx.subscribe();
    let ack = ServerMsg::Authenticated { success: true };
    if let Some(text) = ack.encode() {
        if sender.send(text).await.is_err() {
            return;
        }
    }
    debug!("ws authenticated as user {}", user.id);

    let mut send_task = tokio::spawn(broadcast_handler::broadcast_handler(rx, user.id, sender));
    let mut recv_task = tokio::spawn(recv::recv_ws(receiver));

    // Whichever side finishes first takes the other down with it.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    trace!("ws connection for user {} closed", user.id);
}

/// Everything the server pushes down a socket.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    Authenticated {
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    YourTurn {
        service_name: String,
        message: String,
    },
}

impl ServerMsg {
    pub fn your_turn(service_name: &str) -> ServerMsg {
        ServerMsg::YourTurn {
            service_name: service_name.to_owned(),
            message: TURN_MESSAGE.to_owned(),
        }
    }

    fn encode(&self) -> Option<ws::Message> {
        match serde_json::to_string(self) {
            Ok(text) => Some(ws::Message::Text(text)),
            Err(err) => {
                error!("Failed to serialize {:?}: {}", self, err);
                None
            }
        }
    }
}
