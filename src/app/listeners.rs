use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

use crate::domain::SessionSnapshot;

type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Fan-out list of snapshot listeners.
#[derive(Clone, Default)]
pub struct Listeners {
    registry: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&SessionSnapshot) + Send + Sync + 'static) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        let listener: Listener = Arc::new(listener);
        registry.listeners.push((id, listener));
        trace!(id, total = registry.listeners.len(), "Listener subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Call every listener, in subscription order, with the same snapshot.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe from inside the callback; such changes apply from the next
    /// notification.
    pub fn notify(&self, snapshot: &SessionSnapshot) {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.retain(|(id, _)| *id != self.id);
            trace!(id = self.id, "Listener unsubscribed");
        }
    }
}

/// Publishes snapshots to the watch channel and to listeners, skipping
/// snapshots equal to the last one published.
pub(crate) struct Publisher {
    listeners: Listeners,
    sender: watch::Sender<SessionSnapshot>,
}

impl Publisher {
    pub(crate) fn new(initial: SessionSnapshot, listeners: Listeners) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (sender, receiver) = watch::channel(initial);
        (Self { listeners, sender }, receiver)
    }

    /// Returns true if the snapshot was new.
    pub(crate) fn publish(&self, snapshot: SessionSnapshot) -> bool {
        if *self.sender.borrow() == snapshot {
            return false;
        }
        self.sender.send_replace(snapshot.clone());
        self.listeners.notify(&snapshot);
        true
    }
}
