use axum::extract::ws;
use futures::{Sink, SinkExt};
use log::{debug, trace, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::model::user;

use super::BroadcastMsg;

/// Forward every broadcast addressed to `user_id` into `sender` until either
/// side goes away.
pub(super) async fn broadcast_handler<S>(
    mut rx: broadcast::Receiver<BroadcastMsg>,
    user_id: user::Id,
    mut sender: S,
) where
    S: Sink<ws::Message> + Unpin,
{
    loop {
        let msg = match rx.recv().await {
            Ok(msg) => msg,
            Err(RecvError::Lagged(skipped)) => {
                warn!("ws for user {} lagged, skipped {} events", user_id, skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if msg.target != user_id {
            // Not for us
            continue;
        }

        debug!("sending message to user {}: {:?}", user_id, msg.content);
        let Some(text) = msg.content.encode() else {
            continue;
        };
        if sender.send(text).await.is_err() {
            // client disconnected
            trace!("ws for user {} closed while sending", user_id);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::{channel::mpsc, StreamExt};

    use super::*;
    use crate::{model::Snowflake, routes::ws::ServerMsg};

    fn your_turn(target: i64, service: &str) -> BroadcastMsg {
        BroadcastMsg {
            target: Snowflake::from(target),
            content: ServerMsg::your_turn(service),
        }
    }

    #[tokio::test]
    async fn only_forwards_events_for_its_user() {
        let (tx, rx) = broadcast::channel(8);
        let (sink, received) = mpsc::unbounded::<ws::Message>();

        let task = tokio::spawn(broadcast_handler(rx, Snowflake::from(1), sink));

        tx.send(your_turn(2, "Bursary")).unwrap();
        tx.send(your_turn(1, "Clinic")).unwrap();
        drop(tx);
        task.await.unwrap();

        let forwarded: Vec<_> = received.collect().await;
        assert_eq!(forwarded.len(), 1);
        let ws::Message::Text(text) = &forwarded[0] else {
            panic!("expected a text frame, got {:?}", forwarded[0]);
        };
        let json: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(json["type"], "yourTurn");
        assert_eq!(json["serviceName"], "Clinic");
    }

    #[tokio::test]
    async fn stops_when_the_client_is_gone() {
        let (tx, rx) = broadcast::channel(8);
        let (sink, received) = mpsc::unbounded::<ws::Message>();
        drop(received);

        let task = tokio::spawn(broadcast_handler(rx, Snowflake::from(1), sink));
        tx.send(your_turn(1, "Clinic")).unwrap();

        // Returns even though the channel is still open.
        task.await.unwrap();
    }
}
