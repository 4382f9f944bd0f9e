use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

/// Something observable changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Tree content changed; `scope` is the affected directory, `None` for everything.
    Tree { scope: Option<String> },
    /// Selection membership changed.
    Selection,
}

/// A broadcast receiver of change events.
pub type ChangeStream = broadcast::Receiver<ChangeEvent>;

/// Fan-out of [`ChangeEvent`]s to any number of subscribers.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
    emitted: Arc<AtomicU64>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            emitted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> ChangeStream {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscriber is fine.
    pub fn emit(&self, event: ChangeEvent) {
        self.emitted.fetch_add(1, Ordering::SeqCst);
        trace!(?event, receivers = self.sender.receiver_count(), "emit");
        let _ = self.sender.send(event);
    }

    pub fn tree_changed(&self, scope: Option<&str>) {
        self.emit(ChangeEvent::Tree {
            scope: scope.map(str::to_string),
        });
    }

    pub fn selection_changed(&self) {
        self.emit(ChangeEvent::Selection);
    }

    /// Total number of events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .field("emitted", &self.emitted())
            .finish()
    }
}
