//! "Orders ready" announcements between sessions.
//!
//! Delivery is best-effort: a session that misses a notice still finds the
//! order on its next scheduled poll.

use battle_core::{OrderKey, PlayerId};
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrdersReady {
    pub from: PlayerId,
    pub checkpoint: u64,
    pub key: OrderKey,
}

/// Cloneable handle to the shared notification channel.
#[derive(Clone, Debug)]
pub struct OrderNotifier {
    sender: broadcast::Sender<OrdersReady>,
}

impl OrderNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrdersReady> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notice: OrdersReady) {
        if self.sender.send(notice).is_err() {
            tracing::trace!("no session is listening for order notices");
        }
    }
}

impl Default for OrderNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}
