//! The turn notifier. On a fixed period it looks at the head of every queue
//! and pushes a "your turn is near" event to that user.
//!
//! In [`NotifyMode::EveryTick`] the same head is notified again on every
//! tick for as long as they stay at the front. [`NotifyMode::OnChange`]
//! remembers who was last notified per queue and stays quiet until the head
//! changes.

use std::{collections::HashMap, sync::Arc};

use log::{debug, error, info, trace};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{
    error::Error,
    model::{queue, unix_timestamp, user, AppState, Queue},
    routes::ws::{BroadcastMsg, ServerMsg},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NotifyMode {
    #[default]
    EveryTick,
    OnChange,
}

pub struct Poller {
    mode: NotifyMode,
    last_notified: HashMap<queue::Id, user::Id>,
}

impl Poller {
    pub fn new(mode: NotifyMode) -> Poller {
        Poller {
            mode,
            last_notified: HashMap::new(),
        }
    }

    /// The events one tick sends: at most one per non-empty queue, addressed
    /// to its head of line.
    pub fn tick(&mut self, queues: &[Queue]) -> Vec<BroadcastMsg> {
        let mut messages = Vec::new();

        for queue in queues {
            let Some(head) = queue.head() else {
                continue;
            };

            if self.mode == NotifyMode::OnChange
                && self.last_notified.get(&queue.id) == Some(&head.user)
            {
                trace!("Head of queue {} unchanged, not notifying", queue.id);
                continue;
            }

            messages.push(BroadcastMsg {
                target: head.user,
                content: ServerMsg::your_turn(&queue.service_name),
            });
        }

        if self.mode == NotifyMode::OnChange {
            self.last_notified = queues
                .iter()
                .filter_map(|queue| queue.head().map(|head| (queue.id, head.user)))
                .collect();
        }

        messages
    }
}

/// Run one tick against the store and push its events. Returns how many
/// were sent. Expired sessions are purged on the way.
pub async fn notify(state: &AppState, poller: &mut Poller) -> Result<usize, Error> {
    let queues = {
        let database = state.database.lock().await;
        database.delete_expired_sessions(unix_timestamp())?;
        database.get_queues()?
    };

    let messages = poller.tick(&queues);
    let count = messages.len();

    for msg in messages {
        debug!("Notifying user {} of their turn", msg.target);
        if state.tx.send(msg).is_err() {
            trace!("No websocket clients connected");
        }
    }

    Ok(count)
}

/// Tick forever. The first tick comes one full period after start.
pub async fn run(state: Arc<AppState>) {
    let period = state.settings.poll_interval;
    let mut poller = Poller::new(state.settings.notify_mode);

    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Notifying heads of line every {}",
        humantime::format_duration(period)
    );

    loop {
        ticker.tick().await;
        match notify(&state, &mut poller).await {
            Ok(count) => trace!("Poller tick sent {} notifications", count),
            Err(err) => error!("Notify users error: {}", err),
        }
    }
}
