use super::TrackProgress;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc;
use tracing::debug;

type SubscriptionId = u64;

struct Subscription {
    tx: mpsc::UnboundedSender<TrackProgress>,
}

/// Handle for subscribing to track progress events.
///
/// A single dispatch task drains the controller's upstream channel and fans
/// events out to subscribers, so every subscriber observes events in
/// emission order.
#[derive(Clone)]
pub struct ProgressHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl ProgressHandle {
    /// Create a new progress handle and spawn the dispatch task
    pub fn new(
        mut progress_rx: mpsc::UnboundedReceiver<TrackProgress>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_for_dispatch = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(event) = progress_rx.recv().await {
                // A failed send means the receiver was dropped; prune it.
                subscriptions_for_dispatch
                    .lock()
                    .unwrap()
                    .retain(|_, subscription| subscription.tx.send(event.clone()).is_ok());
            }
            debug!("progress channel closed, dispatch task exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to all future progress events.
    /// The subscription is removed automatically when the receiver is dropped.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TrackProgress> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.subscriptions
            .lock()
            .unwrap()
            .insert(id, Subscription { tx });
        rx
    }
}
