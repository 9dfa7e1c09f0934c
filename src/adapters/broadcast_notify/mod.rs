// Broadcast notifier - Fans task snapshots out to in-process subscribers

use tokio::sync::broadcast;

use crate::domain::model::Task;
use crate::ports::NotifyPort;

/// Snapshot publisher over a `tokio::sync::broadcast` channel.
///
/// Slow subscribers may observe `Lagged` and skip snapshots; every snapshot is
/// the full list, so the latest one received is always complete.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Vec<Task>>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Task>> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotifyPort for BroadcastNotifier {
    fn publish(&self, snapshot: &[Task]) {
        // No subscribers is not an error
        let _ = self.sender.send(snapshot.to_vec());
    }
}
